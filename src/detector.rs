/// Image-side detection: binarization, finder-pattern candidate scanning,
/// perspective fitting from finder centres or ring corners, per-variant
/// decode dispatch and the linear barcode sweep.

use image::GrayImage;
use log::debug;

use crate::canvas::PixelSource;
use crate::config::{CodeType, MaskPattern, Version};
use crate::runlength::RunLength;
use crate::symbol::{QrPattern, Symbol};
use crate::tables;

pub const MAX_CANDIDATES: usize = 32;

const BLACK: u32 = 0x000000;
const WHITE: u32 = 0xFFFFFF;
const RED: u32 = 0xFF0000;
const GREEN: u32 = 0x00FF00;

const PI: f32 = std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

pub fn point(x: f32, y: f32) -> Point {
    Point { x, y }
}

impl Point {
    fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn angle_to(self, p: Point) -> f32 {
        (p.y - self.y).atan2(p.x - self.x)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Extent {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Extent {
    fn center(&self) -> Point {
        point((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct PaintResult {
    extent: Extent,
    area: u32,
}

/// Binarized working raster; pixel values are BLACK, WHITE or a paint
/// marker. Reads outside the frame come back as 0.
#[derive(Clone)]
pub struct WorkImage {
    w: i32,
    h: i32,
    pix: Vec<u32>,
}

impl WorkImage {
    fn get_i(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x >= self.w || y >= self.h {
            return 0;
        }
        self.pix[(y * self.w + x) as usize]
    }

    fn set_i(&mut self, x: i32, y: i32, v: u32) {
        if x < 0 || y < 0 || x >= self.w || y >= self.h {
            return;
        }
        self.pix[(y * self.w + x) as usize] = v;
    }

    fn get(&self, p: Point) -> u32 {
        self.get_i(p.x.round() as i32, p.y.round() as i32)
    }

    /// scanline flood fill from `center`; returns the painted extent and
    /// area
    fn paint(&mut self, center: Point, color: u32) -> PaintResult {
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;
        let mut result = PaintResult {
            extent: Extent { top: cy as f32, left: cx as f32, bottom: cy as f32, right: cx as f32 },
            area: 0,
        };
        if cx < 0 || cy < 0 || cx >= self.w || cy >= self.h {
            return result;
        }

        let bg = self.get_i(cx, cy);
        if bg == color {
            return result;
        }

        let mut stack = vec![(cx, cy)];
        while let Some((sx, sy)) = stack.pop() {
            if self.get_i(sx, sy) != bg {
                continue;
            }

            let mut lx = sx;
            while lx >= 0 && self.get_i(lx, sy) == bg {
                self.set_i(lx, sy, color);
                result.area += 1;
                lx -= 1;
            }
            let mut rx = sx + 1;
            while rx < self.w && self.get_i(rx, sy) == bg {
                self.set_i(rx, sy, color);
                result.area += 1;
                rx += 1;
            }

            result.extent.left = result.extent.left.min((lx + 1) as f32);
            result.extent.right = result.extent.right.max((rx - 1) as f32);
            result.extent.top = result.extent.top.min(sy as f32);
            result.extent.bottom = result.extent.bottom.max(sy as f32);

            for x in (lx + 1)..rx {
                if self.get_i(x, sy - 1) == bg {
                    stack.push((x, sy - 1));
                }
                if self.get_i(x, sy + 1) == bg {
                    stack.push((x, sy + 1));
                }
            }
        }

        result
    }
}

/// Gamma correction followed by Otsu's threshold over the histogram.
pub fn binarize(src: &GrayImage, gamma: f32) -> WorkImage {
    let (w, h) = src.dimensions();
    let mut hist = [0usize; 256];
    let mut gray = vec![0u8; (w * h) as usize];

    for (i, p) in src.pixels().enumerate() {
        let v = ((p.0[0] as f32 / 255.0).powf(1.0 / gamma) * 255.0) as u8;
        gray[i] = v;
        hist[v as usize] += 1;
    }

    let mut threshold = 0u32;
    let mut max_sigma = 0.0f32;
    for t in 0..256 {
        let mut w0 = 0.0f32;
        let mut w1 = 0.0f32;
        let mut m0 = 0.0f32;
        let mut m1 = 0.0f32;

        for i in 0..256 {
            if i < t {
                w0 += hist[i] as f32;
                m0 += (i * hist[i]) as f32;
            } else {
                w1 += hist[i] as f32;
                m1 += (i * hist[i]) as f32;
            }
        }
        if w0 == 0.0 || w1 == 0.0 {
            continue;
        }
        m0 /= w0;
        m1 /= w1;

        let sigma = (w0 * w1) * (m0 - m1) * (m0 - m1);
        if sigma > max_sigma {
            max_sigma = sigma;
            threshold = t as u32;
        }
    }
    debug!("threshold: {}", threshold);

    let pix = gray
        .iter()
        .map(|&v| if (v as u32) < threshold { BLACK } else { WHITE })
        .collect();
    WorkImage { w: w as i32, h: h as i32, pix }
}

pub fn morphology_erode(img: &mut WorkImage) {
    let src = img.clone();
    for y in 0..src.h {
        for x in 0..src.w {
            if src.get_i(x, y) == BLACK {
                continue;
            }
            'probe: for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx != 0 || dy != 0)
                        && x + dx >= 0
                        && y + dy >= 0
                        && x + dx < src.w
                        && y + dy < src.h
                        && src.get_i(x + dx, y + dy) == BLACK
                    {
                        img.set_i(x, y, BLACK);
                        break 'probe;
                    }
                }
            }
        }
    }
}

pub fn morphology_dilate(img: &mut WorkImage) {
    let src = img.clone();
    for y in 0..src.h {
        for x in 0..src.w {
            if src.get_i(x, y) != BLACK {
                continue;
            }
            'probe: for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx != 0 || dy != 0)
                        && x + dx >= 0
                        && y + dy >= 0
                        && x + dx < src.w
                        && y + dy < src.h
                        && src.get_i(x + dx, y + dy) != BLACK
                    {
                        img.set_i(x, y, WHITE);
                        break 'probe;
                    }
                }
            }
        }
    }
}

pub fn morphology_close(img: &mut WorkImage) {
    morphology_erode(img);
    morphology_dilate(img);
}

pub fn morphology_open(img: &mut WorkImage) {
    morphology_dilate(img);
    morphology_erode(img);
}

/// Row-major 3x3 homography with the ninth parameter fixed to 1; maps
/// symbol-module coordinates to image pixels.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    m: [f32; 8],
}

pub fn transform_point(p: Point, t: &Transform) -> Point {
    let x = t.m[0] * p.x + t.m[1] * p.y + t.m[2];
    let y = t.m[3] * p.x + t.m[4] * p.y + t.m[5];
    let w = t.m[6] * p.x + t.m[7] * p.y + 1.0;
    point(x / w, y / w)
}

/// Solve the eight perspective parameters from four point pairs by
/// Gauss-Jordan elimination with partial pivoting.
pub fn create_transform(src: &[Point; 4], dst: &[Point; 4]) -> Transform {
    let mut a = [[0.0f32; 8]; 8];
    let mut b = [0.0f32; 8];

    for i in 0..4 {
        let (sx, sy) = (src[i].x, src[i].y);
        let (dx, dy) = (dst[i].x, dst[i].y);
        a[i * 2] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -sx * dx, -sy * dx];
        a[i * 2 + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -sx * dy, -sy * dy];
        b[i * 2] = dx;
        b[i * 2 + 1] = dy;
    }

    for i in 0..8 {
        let mut pivot = i;
        for j in (i + 1)..8 {
            if a[j][i].abs() > a[pivot][i].abs() {
                pivot = j;
            }
        }
        a.swap(i, pivot);
        b.swap(i, pivot);

        for j in (i + 1)..8 {
            let ratio = a[j][i] / a[i][i];
            for k in i..8 {
                a[j][k] -= a[i][k] * ratio;
            }
            b[j] -= b[i] * ratio;
        }
    }

    for i in (0..8).rev() {
        for j in (i + 1)..8 {
            b[i] -= a[i][j] * b[j];
        }
        b[i] /= a[i][i];
    }

    Transform { m: b }
}

/// Source and destination quadrilaterals plus the fitted homography.
#[derive(Clone, Copy, Debug)]
pub struct Perspective {
    pub src: [Point; 4],
    pub dst: [Point; 4],
    pub h: Transform,
}

impl Perspective {
    /// Three finder centres (top-left, top-right, bottom-left); the fourth
    /// keystone is the parallelogram completion.
    fn from_finder_centers(w: i32, h: i32, centers: &[Point; 3], border_offset: i32) -> Perspective {
        let o = border_offset as f32;
        let src = [
            point(3.0 + o, 3.0 + o),
            point(w as f32 - 4.0 - o, 3.0 + o),
            point(w as f32 - 4.0 - o, h as f32 - 4.0 - o),
            point(3.0 + o, h as f32 - 4.0 - o),
        ];
        let dst = [
            centers[0],
            centers[1],
            point(
                centers[0].x + (centers[1].x - centers[0].x) + (centers[2].x - centers[0].x),
                centers[0].y + (centers[1].y - centers[0].y) + (centers[2].y - centers[0].y),
            ),
            centers[2],
        ];
        Perspective { src, dst, h: create_transform(&src, &dst) }
    }

    /// The four ring corners of a single finder, rotated by `offset`.
    fn from_ring_corners(ring: &[Point; 4], offset: usize) -> Perspective {
        let modsize = ring[offset % 4].distance(ring[(1 + offset) % 4]) / 7.0;
        let d = 0.5 / modsize;

        let src = [
            point(-0.5 + d, -0.5 + d),
            point(6.5 - d, -0.5 + d),
            point(6.5 - d, 6.5 - d),
            point(-0.5 + d, 6.5 - d),
        ];
        let dst = [
            ring[offset % 4],
            ring[(1 + offset) % 4],
            ring[(2 + offset) % 4],
            ring[(3 + offset) % 4],
        ];
        Perspective { src, dst, h: create_transform(&src, &dst) }
    }

    fn refit(&mut self) {
        self.h = create_transform(&self.src, &self.dst);
    }
}

struct WarpSampler<'a> {
    img: &'a WorkImage,
    h: Transform,
}

impl<'a> PixelSource for WarpSampler<'a> {
    fn read_pixel(&self, x: i32, y: i32) -> bool {
        self.img.get(transform_point(point(x as f32, y as f32), &self.h)) == BLACK
    }
}

fn resample(sym: &mut Symbol, img: &WorkImage, warp: &Perspective) {
    sym.sample_from(&WarpSampler { img, h: warp.h });
}

#[derive(Clone, Copy, Debug)]
pub struct FinderCandidate {
    pub center: Point,
    pub extent: Extent,
    pub area: u32,
    pub corners: [Point; 4],
}

/// Scan every row for the 1:1:3:1:1 signature, verify it vertically,
/// flood-fill the centre block and the ring, and extract the ring's four
/// corners by a shrinking polar sweep.
pub fn scan_finder_candidates(src: &WorkImage) -> Vec<FinderCandidate> {
    let mut img = src.clone();
    let mut candidates: Vec<FinderCandidate> = Vec::new();

    for y in 0..img.h {
        let mut rl = RunLength::new();

        for x in 0..img.w {
            let v = img.get_i(x, y);
            if v != BLACK && v != WHITE {
                rl.reset();
                continue;
            }
            if !rl.push_value(v) {
                continue;
            }
            if v == BLACK || !rl.match_ratio(&[1, 1, 3, 1, 1, 0]) {
                continue;
            }

            // dark modules at the centre and on both rings
            let cx = x - rl.sum(1, 4) as i32 + rl.get(3) as i32 / 2;
            let lx = x - rl.sum(1, 6) as i32 + rl.get(5) as i32 / 2;
            let rx = x - rl.sum(1, 2) as i32 + rl.get(1) as i32 / 2;

            let len = rl.sum(1, 6) as i32;
            let cy = y;

            if img.get_i(cx, cy) != BLACK || img.get_i(lx, cy) != BLACK || img.get_i(rx, cy) != BLACK {
                continue;
            }

            // the vertical cut must look like a finder too
            let mut rlvu = RunLength::new();
            let mut rlvd = RunLength::new();
            let mut found_u = 0;
            let mut found_d = 0;
            for yy in 0..len {
                if found_u == 0 && rlvu.push_value(img.get_i(cx, cy - yy)) && rlvu.match_ratio(&[2, 2, 0]) {
                    found_u = rlvu.sum(1, 3);
                }
                if found_d == 0 && rlvd.push_value(img.get_i(cx, cy + yy)) && rlvd.match_ratio(&[2, 2, 0]) {
                    found_d = rlvd.sum(1, 3);
                }
            }
            if found_u == 0 && rlvu.match_ratio(&[2, 2, 0]) {
                found_u = rlvu.sum(1, 3);
            }
            if found_d == 0 && rlvd.match_ratio(&[2, 2, 0]) {
                found_d = rlvd.sum(1, 3);
            }

            if candidates.len() >= MAX_CANDIDATES || found_u == 0 || found_d == 0 {
                continue;
            }

            // mark the visit by painting the inner block
            let inner_block = img.paint(point(cx as f32, cy as f32), GREEN);

            // the rings must be disconnected from the inner block
            if img.get_i(lx, cy) != BLACK || img.get_i(rx, cy) != BLACK {
                continue;
            }

            // and connected to each other
            let ring = img.paint(point(lx as f32, cy as f32), RED);
            if img.get_i(lx, cy) != img.get_i(rx, cy) {
                img.paint(point(lx as f32, cy as f32), BLACK); // paint it back ;)
                continue;
            }

            let real_c = ring.extent.center();
            if img.get(real_c) != GREEN {
                continue;
            }

            // find ring corners
            let rw = ring.extent.right - ring.extent.left;
            let rh = ring.extent.bottom - ring.extent.top;
            let mut cidx = 0;
            let mut thetas = [f32::NAN; 4];
            let mut corners = [point(0.0, 0.0); 4];

            let mut r = (rw * rw + rh * rh).sqrt() * 1.1;
            while r > 0.0 && cidx < 4 {
                let mut theta = 0.0f32;
                while theta < 2.0 * PI && cidx < 4 {
                    let px = (cx as f32 + r * theta.sin()).floor();
                    let py = (cy as f32 - r * theta.cos()).floor();

                    if img.get(point(px, py)) == RED {
                        let slot = if cidx == 0 {
                            0
                        } else {
                            ((theta + 2.0 * PI + PI / 4.0 - thetas[0]).rem_euclid(2.0 * PI) / (PI / 2.0)).floor()
                                as usize
                        };

                        if slot < 4 && thetas[slot].is_nan() {
                            corners[slot] = point(px, py);
                            thetas[slot] = theta;
                            cidx += 1;
                        }
                    }
                    theta += 1.0 / r;
                }
                r -= 0.2;
            }

            if cidx < 4 {
                // no corners... paint it back
                img.paint(point(lx as f32, cy as f32), BLACK);
                continue;
            }

            candidates.push(FinderCandidate {
                center: real_c,
                extent: ring.extent,
                area: inner_block.area,
                corners,
            });
        }
    }

    debug!("{} finder candidate(s)", candidates.len());
    candidates
}

/// Refine the bottom-right keystone of a QR fit against the outermost
/// alignment pattern. Returns true when the homography was adjusted.
fn fit_for_qr(warp: &mut Perspective, sym: &mut Symbol, img: &WorkImage, version: u8) -> bool {
    let mut work = img.clone();

    let n = tables::qr_alignment_num(version);
    if n == 0 {
        return false;
    }
    let i = n - 1;
    let (cx, cy) = tables::qr_alignment_position(version, i);
    let (cx, cy) = (cx as f32, cy as f32);

    let c = transform_point(point(cx, cy), &warp.h);
    let next = transform_point(point(cx + 1.0, cy), &warp.h);
    let module_size = next.distance(c);

    let dist = 5.0;
    let mut y = cy - dist;
    while y < cy + dist {
        let mut x = cx - dist;
        while x < cx + dist {
            let p = transform_point(point(x, y), &warp.h);
            let ring = transform_point(point(x + 1.0, y), &warp.h);
            if work.get(p) == BLACK && work.get(ring) == WHITE {
                let result = work.paint(ring, RED);
                if module_size * module_size < result.area as f32
                    && (result.area as f32) < module_size * module_size * 16.0
                {
                    let new_center = result.extent.center();

                    let backup = *warp;
                    warp.src[2] = point(cx, cy);
                    warp.dst[2] = new_center;
                    warp.refit();
                    resample(sym, img, warp);

                    if sym.read_pattern_error(QrPattern::Alignment, Some(i)) < 10 {
                        return true;
                    }

                    // restore if it doesn't fit
                    *warp = backup;
                    resample(sym, img, warp);
                }
            }
            x += 0.2;
        }
        y += 0.2;
    }

    false
}

#[derive(Clone, Debug)]
pub struct Detection {
    pub kind: CodeType,
    pub version: Option<Version>,
    pub text: String,
}

pub fn try_decode_qr(img: &WorkImage, candidates: &[FinderCandidate]) -> Vec<Detection> {
    let mut found = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            for k in (j + 1)..candidates.len() {
                let orders = [[i, j, k], [i, k, j], [j, i, k], [j, k, i], [k, i, j], [k, j, i]];
                'triple: for order in orders.iter() {
                    let centers = [
                        candidates[order[0]].center,
                        candidates[order[1]].center,
                        candidates[order[2]].center,
                    ];

                    for version in 1..=40u8 {
                        let mut sym = Symbol::new(CodeType::Qr);
                        sym.set_version(Version::Qr(version)).unwrap();

                        let w = sym.canvas.symbol_width as i32;
                        let h = sym.canvas.symbol_height as i32;
                        let mut warp = Perspective::from_finder_centers(w, h, &centers, 0);
                        resample(&mut sym, img, &warp);

                        if sym.read_pattern_error(QrPattern::Finder, None) > 10 {
                            continue;
                        }

                        fit_for_qr(&mut warp, &mut sym, img, version);

                        let fi = match sym.read_format_info() {
                            Some(fi) => fi,
                            None => continue,
                        };
                        sym.set_format_info(fi);

                        match sym.read_version_info() {
                            Some(vi) if vi.version == version => {}
                            _ => continue,
                        }

                        if sym.fix_errors().is_ok() {
                            if let Ok(data) = sym.read_qr_data() {
                                debug!("detected as QR version {}", version);
                                found.push(Detection {
                                    kind: CodeType::Qr,
                                    version: Some(Version::Qr(version)),
                                    text: String::from_utf8_lossy(&data).into_owned(),
                                });
                                break 'triple;
                            }
                        }
                    }
                }
            }
        }
    }

    found
}

pub fn try_decode_tqr(img: &WorkImage, candidates: &[FinderCandidate]) -> Vec<Detection> {
    let mut found = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            for k in (j + 1)..candidates.len() {
                let orders = [[i, j, k], [i, k, j], [j, i, k], [j, k, i], [k, i, j], [k, j, i]];
                'triple: for order in orders.iter() {
                    let centers = [
                        candidates[order[0]].center,
                        candidates[order[1]].center,
                        candidates[order[2]].center,
                    ];

                    let mut sym = Symbol::new(CodeType::Tqr);
                    sym.set_mask(MaskPattern::Pattern(0));

                    let w = sym.canvas.symbol_width as i32;
                    let h = sym.canvas.symbol_height as i32;
                    let warp = Perspective::from_finder_centers(w, h, &centers, 2);
                    resample(&mut sym, img, &warp);

                    if sym.read_pattern_error(QrPattern::Finder, None) <= 10 && sym.fix_errors().is_ok() {
                        if let Ok(data) = sym.read_qr_data() {
                            debug!("detected as tQR");
                            found.push(Detection {
                                kind: CodeType::Tqr,
                                version: Some(Version::Tqr),
                                text: String::from_utf8_lossy(&data).into_owned(),
                            });
                            break 'triple;
                        }
                    }
                }
            }
        }
    }

    found
}

pub fn try_decode_mqr(img: &WorkImage, candidates: &[FinderCandidate]) -> Vec<Detection> {
    let mut found = Vec::new();

    for cand in candidates {
        for c in 0..4 {
            let mut sym = Symbol::new(CodeType::MicroQr);
            sym.set_version(Version::Micro(4)).unwrap(); // max size

            let warp = Perspective::from_ring_corners(&cand.corners, c);
            resample(&mut sym, img, &warp);

            let fi = match sym.read_format_info() {
                Some(fi) => fi,
                None => continue,
            };
            sym.set_format_info(fi);
            resample(&mut sym, img, &warp); // dimensions may have shrunk

            if sym.read_pattern_error(QrPattern::Timing, None) <= 10 && sym.fix_errors().is_ok() {
                if let Ok(data) = sym.read_qr_data() {
                    debug!("detected as mQR version {}", sym.version().to_string());
                    found.push(Detection {
                        kind: CodeType::MicroQr,
                        version: Some(sym.version()),
                        text: String::from_utf8_lossy(&data).into_owned(),
                    });
                    break;
                }
            }
        }
    }

    found
}

fn find_corner(img: &WorkImage, c: Point, pix: u32, max_dist: f32, center_theta: f32, delta_theta: f32) -> Point {
    let mut r = max_dist;
    while r > 0.0 {
        let mut theta = center_theta - delta_theta;
        while theta <= center_theta + delta_theta {
            let p = point(c.x + r * theta.cos(), c.y + r * theta.sin());
            if img.get(p) == pix {
                return p;
            }
            theta += 1.0 / max_dist;
        }
        r -= 0.2;
    }
    c
}

fn find_rmqr_corner_finder_pattern(
    img: &WorkImage,
    warp: &Perspective,
    a: Point,
    angle: f32,
    dist: f32,
    corner_size: u32,
) -> Option<Point> {
    let modsize = warp.dst[0].distance(warp.dst[1]) / 7.0;

    let mut last_p = None;
    let mut found = 0.0f32;
    let mut delta = 1.0 / dist;
    if delta < 0.01 {
        delta = 0.01;
    }

    let mut theta = angle - PI / 32.0;
    while theta <= angle + PI / 32.0 {
        let mut rl = RunLength::new();
        let mut i = 0.0f32;
        while i < dist * 2.0 {
            let p = point(a.x + i * theta.cos(), a.y + i * theta.sin());
            let pix = if img.get(p) == BLACK { 1 } else { 0 };
            if rl.push_value(pix) {
                let ratio = (rl.get(1) as f32 / modsize).round() as i32;
                if ratio != 0 && ratio != 5 && ratio != 6 && ratio != 7 && ratio != 1 && ratio != 3 {
                    break;
                }
            }

            if rl.match_ratio(&[1, 1, 1, 1, 1, corner_size, 2]) && pix == 0 {
                let n = i - rl.get(0) as f32 - rl.get(0) as f32 / 2.0;
                let p = point(a.x + n * theta.cos(), a.y + n * theta.sin());

                if img.get(p) == BLACK && found < n {
                    let mut work = img.clone();
                    let painted = work.paint(p, RED);
                    let c = painted.extent.center();
                    let d = c.distance(p) * 1.2;
                    let refined = find_corner(&work, c, RED, d, c.angle_to(p), modsize * 1.5 / d);

                    found = n;
                    last_p = Some(refined);
                }
            }

            i += 1.0;
        }
        theta += delta;
    }

    last_p
}

/// Multi-step rMQR corner refinement: right-top, left-bottom,
/// right-bottom, then left-top, keeping the new fit only when the corner
/// finder templates agree.
fn fit_for_rmqr(warp: &mut Perspective, sym: &mut Symbol, img: &WorkImage) -> bool {
    let w = sym.canvas.symbol_width as f32;
    let h = sym.canvas.symbol_height as f32;

    let a = transform_point(point(0.0, 0.0), &warp.h);
    let b = transform_point(point(w - 1.0, 0.0), &warp.h);
    let c = transform_point(point(w - 1.0, h - 1.0), &warp.h);
    let d = transform_point(point(0.0, h - 1.0), &warp.h);
    let modsize = warp.dst[0].distance(warp.dst[1]) / 7.0;
    let delta = 0.5 / modsize;

    let rt = find_rmqr_corner_finder_pattern(img, warp, a, a.angle_to(b), a.distance(b), 3);
    let mut lb = find_rmqr_corner_finder_pattern(img, warp, a, a.angle_to(d), a.distance(d), 3);
    if lb.is_none() {
        let center = transform_point(point(3.5, 3.5), &warp.h);
        let dist = center.distance(d) * 1.2;
        lb = Some(find_corner(img, center, BLACK, dist, center.angle_to(d), modsize * 1.5 / dist));
    }
    let lb = lb.unwrap();
    let rb = find_rmqr_corner_finder_pattern(img, warp, lb, d.angle_to(c), d.distance(c), 5);
    let lt = {
        let center = transform_point(point(3.5, 3.5), &warp.h);
        let dist = center.distance(a) * 1.2;
        find_corner(img, center, BLACK, dist, center.angle_to(a), modsize * 1.5 / dist)
    };

    let rt = match rt {
        Some(p) => p,
        None => return false,
    };
    let rb = match rb {
        Some(p) => p,
        None => return false,
    };

    let backup = *warp;

    warp.src[0] = point(-0.5 + delta, -0.5 + delta);
    warp.dst[0] = lt;

    warp.src[1] = point(w - 0.5 - delta, -0.5 + delta);
    warp.dst[1] = rt;

    warp.src[2] = point(w - 0.5 - delta, h - 0.5 - delta);
    warp.dst[2] = rb;

    if lb.x != d.x || lb.y != d.y {
        warp.src[3] = point(-0.5 + delta, h - 0.5 - delta);
        warp.dst[3] = lb;
    }
    warp.refit();
    resample(sym, img, warp);

    if sym.read_pattern_error(QrPattern::CornerFinder, None) < 10 {
        return true;
    }

    // restore if it doesn't fit
    *warp = backup;
    resample(sym, img, warp);
    false
}

pub fn try_decode_rmqr(img: &WorkImage, candidates: &[FinderCandidate]) -> Vec<Detection> {
    let mut found = Vec::new();

    for cand in candidates {
        for c in 0..4 {
            let mut sym = Symbol::new(CodeType::Rmqr);
            sym.set_version(Version::Rect(29)).unwrap(); // max size, R17x139

            let mut warp = Perspective::from_ring_corners(&cand.corners, c);
            resample(&mut sym, img, &warp);

            let fi = match sym.read_format_info() {
                Some(fi) => fi,
                None => continue,
            };
            sym.set_format_info(fi);
            resample(&mut sym, img, &warp);

            fit_for_rmqr(&mut warp, &mut sym, img);

            if sym.fix_errors().is_ok() {
                if let Ok(data) = sym.read_qr_data() {
                    debug!("detected as rMQR version {}", sym.version().to_string());
                    found.push(Detection {
                        kind: CodeType::Rmqr,
                        version: Some(sym.version()),
                        text: String::from_utf8_lossy(&data).into_owned(),
                    });
                    break;
                }
            }
        }
    }

    found
}

// EAN: 101                  1, 1, 1
// CODE39: 100010111011101   1, 3, 1, 1, 3, 1, 3, 1, 1
// CODE93: 10101111          1, 1, 1, 1, 4
// ITF: 101                  1, 1, 1
// NW7-A: 1011100010001      1, 1, 3, 3, 1, 3, 1
// NW7-B: 1000100010111      1, 3, 1, 3, 1, 1, 3
// NW7-C: 1010001000111      1, 1, 1, 3, 1, 3, 3
// NW7-D: 1010001110001      1, 1, 1, 3, 3, 3, 1
fn barcode_signature(rl: &RunLength) -> Option<(u32, f32, usize)> {
    if rl.match_ratio(&[1, 3, 1, 1, 3, 1, 3, 1, 1, 0]) {
        // CODE39
        let n = rl.sum(1, 10);
        Some((n, n as f32 / (6.0 + 3.0 * 3.0), 10))
    } else if rl.match_ratio(&[1, 1, 3, 3, 1, 3, 1, 0])
        || rl.match_ratio(&[1, 3, 1, 3, 1, 1, 3, 0])
        || rl.match_ratio(&[1, 1, 1, 3, 1, 3, 3, 0])
        || rl.match_ratio(&[1, 1, 1, 3, 3, 3, 1, 0])
    {
        // NW7
        let n = rl.sum(1, 8);
        Some((n, n as f32 / (4.0 + 3.0 * 3.0), 8))
    } else if rl.match_ratio(&[1, 1, 1, 1, 4, 0]) {
        // CODE93
        let n = rl.sum(1, 6);
        Some((n, n as f32 / 8.0, 6))
    } else if rl.match_ratio(&[1, 1, 1, 0]) {
        // EAN or ITF
        let n = rl.sum(1, 4);
        Some((n, n as f32 / 3.0, 4))
    } else {
        None
    }
}

fn scan_barcode(
    rl: &mut RunLength,
    work: &mut WorkImage,
    src: &WorkImage,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    out: &mut Vec<Detection>,
) {
    let v = work.get_i(x, y);
    if v != BLACK && v != WHITE {
        rl.reset();
        return;
    }
    if !rl.push_value(v) {
        return;
    }
    if v == BLACK {
        return;
    }

    let (n, mut barsize, quiet_at) = match barcode_signature(rl) {
        Some(s) => s,
        None => return,
    };
    if (rl.get(quiet_at) as f32) < 2.0 * barsize {
        return; // quiet zone required
    }

    let codes = [
        CodeType::Ean13,
        CodeType::Ean8,
        CodeType::UpcA,
        CodeType::Code39,
        CodeType::Code93,
        CodeType::Itf,
        CodeType::Nw7,
    ];

    let sx = x - (n as i32 + 1) * dx;
    let sy = y - (n as i32 + 1) * dy;
    let mut ex = sx;
    let mut ey = sy;

    // walk along the bar direction collecting runs
    let mut rl2 = RunLength::new();
    let mut bars: i32 = 0;
    let mut xx = sx;
    let mut yy = sy;
    while xx >= 0 && xx < work.w && yy >= 0 && yy < work.h {
        let v = work.get_i(xx, yy);
        if rl2.push_value(v) {
            let last_count = rl2.get(1);
            bars += (last_count as f32 / barsize).round() as i32;
        } else if v != BLACK && rl2.get(0) as f32 >= barsize * 10.0 {
            // stop
            ex = xx - (rl2.get(0) as i32 - 1) * dx;
            ey = yy - (rl2.get(0) as i32 - 1) * dy;
            let span = (((ex - sx) * (ex - sx) + (ey - sy) * (ey - sy)) as f32).sqrt();
            barsize = span / bars as f32;
            break;
        }
        xx += dx;
        yy += dy;
    }

    if (ex == sx && ey == sy) || bars <= 0 || barsize <= 0.0 {
        return; // not found
    }

    let mat = Transform {
        m: [
            barsize * dx as f32,
            0.0,
            sx as f32 + dx as f32 * barsize / 2.0,
            barsize * dy as f32,
            0.0,
            sy as f32 + dy as f32 * barsize / 2.0,
            0.0,
            0.0,
        ],
    };

    for &kind in codes.iter() {
        let mut sym = Symbol::new(kind);
        let modules = bars.min(1024);
        sym.set_symbol_width(modules as u16);
        for m in 0..modules {
            let p = transform_point(point(m as f32, 0.0), &mat);
            let v = src.get(p) == BLACK;
            sym.write_pixel(m, 0, v);
        }

        if let Ok(data) = sym.read_buffer() {
            debug!("detected as {}", kind.name());
            out.push(Detection {
                kind,
                version: None,
                text: String::from_utf8_lossy(&data).into_owned(),
            });

            // paint the bars to prevent a second detection
            let mut xx = sx;
            let mut yy = sy;
            while (xx, yy) != (ex, ey) && xx >= 0 && yy >= 0 && xx < work.w && yy < work.h {
                if work.get_i(xx, yy) == BLACK {
                    work.paint(point(xx as f32, yy as f32), RED);
                }
                xx += dx;
                yy += dy;
            }
        }
    }
}

/// Sweep horizontal and vertical lines looking for 1-D symbol leaders.
pub fn scan_barcodes(src: &WorkImage) -> Vec<Detection> {
    let step = 10;
    let mut out = Vec::new();
    let mut work = src.clone();

    let mut y = 0;
    while y < work.h {
        let mut rl = RunLength::new();
        for x in 0..work.w {
            scan_barcode(&mut rl, &mut work, src, x, y, 1, 0, &mut out);
        }
        rl.reset();
        let w = work.w;
        for x in 0..w {
            scan_barcode(&mut rl, &mut work, src, w - 1 - x, y, -1, 0, &mut out);
        }
        y += step;
    }

    let mut x = 0;
    while x < work.w {
        let mut rl = RunLength::new();
        for y in 0..work.h {
            scan_barcode(&mut rl, &mut work, src, x, y, 0, 1, &mut out);
        }
        rl.reset();
        let h = work.h;
        for y in 0..h {
            scan_barcode(&mut rl, &mut work, src, x, h - 1 - y, 0, -1, &mut out);
        }
        x += step;
    }

    out
}

/// Full pipeline over a grayscale raster: binarize, hunt QR-family
/// symbols from finder candidates, then sweep for 1-D codes.
pub fn detect_with_gamma(img: &GrayImage, gamma: f32) -> Vec<Detection> {
    let bin = binarize(img, gamma);
    let candidates = scan_finder_candidates(&bin);

    let mut out = Vec::new();
    out.extend(try_decode_qr(&bin, &candidates));
    if out.is_empty() {
        out.extend(try_decode_tqr(&bin, &candidates));
    }
    out.extend(try_decode_mqr(&bin, &candidates));
    out.extend(try_decode_rmqr(&bin, &candidates));
    out.extend(scan_barcodes(&bin));
    out
}

pub fn detect(img: &GrayImage) -> Vec<Detection> {
    detect_with_gamma(img, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Padding;
    use crate::config::DataType;

    fn render(sym: &mut Symbol, quiet: u8) -> GrayImage {
        sym.canvas.bitmap_padding = Padding::uniform(quiet);
        sym.canvas.bitmap_scale = 4;
        sym.to_image()
    }

    #[test]
    fn test_gauss_jordan_identityish() {
        let src = [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)];
        let dst = [point(5.0, 5.0), point(25.0, 5.0), point(25.0, 25.0), point(5.0, 25.0)];
        let t = create_transform(&src, &dst);
        let p = transform_point(point(5.0, 5.0), &t);
        assert!((p.x - 15.0).abs() < 0.001 && (p.y - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_binarize_splits_extremes() {
        let img = GrayImage::from_fn(16, 16, |x, _| if x < 8 { image::Luma([10u8]) } else { image::Luma([240u8]) });
        let bin = binarize(&img, 1.0);
        assert_eq!(bin.get_i(0, 0), BLACK);
        assert_eq!(bin.get_i(15, 0), WHITE);
    }

    #[test]
    fn test_finder_candidates_on_clean_symbol() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("FINDERS", DataType::Auto).unwrap();
        let img = render(&mut sym, 4);
        let bin = binarize(&img, 1.0);
        let candidates = scan_finder_candidates(&bin);
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_detects_clean_qr() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("HELLO DETECTOR", DataType::Auto).unwrap();
        let img = render(&mut sym, 4);

        let hits = detect(&img);
        assert!(hits.iter().any(|d| d.kind == CodeType::Qr && d.text == "HELLO DETECTOR"));
    }

    #[test]
    fn test_detects_byte_mode_qr() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("https://example.com/scan", DataType::Auto).unwrap();
        let img = render(&mut sym, 4);

        let hits = detect(&img);
        assert!(hits.iter().any(|d| d.text == "https://example.com/scan"));
    }

    #[test]
    fn test_detects_ean13() {
        let mut sym = Symbol::new(CodeType::Ean13);
        sym.write_buffer(b"123456789012", DataType::Auto).unwrap();
        sym.canvas.symbol_height = 40; // tall enough for the row sweep
        let img = render(&mut sym, 10);

        let hits = detect(&img);
        assert!(hits.iter().any(|d| d.kind == CodeType::Ean13 && d.text == "1234567890128"));
    }

    #[test]
    fn test_empty_image_detects_nothing() {
        let img = GrayImage::from_pixel(64, 64, image::Luma([255u8]));
        let hits = detect(&img);
        assert!(hits.is_empty());
    }
}
