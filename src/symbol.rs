/// The unified symbol façade: one value type configurable for any code
/// type, with the full lifecycle of init, frame writing, payload
/// composition, automatic version and mask selection, error fixing and
/// bitmap IO.

use log::debug;

use crate::bitstream::{self, BitBuffer, BitStream, PosIter};
use crate::canvas::{Canvas, Padding, PixelSink, PixelSource, SymCtx, QR_FAMILY_STRIDE};
use crate::config::{CodeType, DataType, EccLevel, EciCode, MaskPattern, SymbolConfig, Version};
use crate::error::QrError;
use crate::formatinfo::{FormatInfo, VersionInfo};
use crate::masking;
use crate::payload::Payload;
use crate::tables;
use crate::{bitcoding, code_code39, code_code93, code_ean, code_itf, code_mqr, code_nw7, code_qr, code_rmqr, code_tqr};

/// function patterns the detector probes for template agreement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QrPattern {
    Finder,
    FinderSub,
    CornerFinder,
    Alignment,
    Timing,
}

pub struct Symbol {
    code: CodeType,
    pub canvas: Canvas,
    version: Version,
    auto_version: bool,
    level: EccLevel,
    mask: MaskPattern,
    eci: EciCode,
}

impl Symbol {
    pub fn new(code: CodeType) -> Symbol {
        let mut sym = Symbol {
            code,
            canvas: Canvas::new(if code.is_qr_family() { QR_FAMILY_STRIDE } else { 0 }),
            version: Version::Qr(1),
            auto_version: true,
            level: EccLevel::M,
            mask: MaskPattern::Auto,
            eci: EciCode::Latin1,
        };

        if code.is_qr_family() {
            let initial = match code {
                CodeType::MicroQr => Version::Micro(1),
                CodeType::Rmqr => Version::Rect(0),
                CodeType::Tqr => Version::Tqr,
                _ => Version::Qr(1),
            };
            sym.use_version(initial);
            sym.auto_version = true;
        } else {
            sym.canvas.symbol_height = 10;
        }

        sym.canvas.bitmap_padding = match code {
            CodeType::Rmqr => Padding::uniform(2),
            CodeType::Itf => Padding { t: 4, r: 10, b: 4, l: 10 },
            _ => Padding::none(),
        };

        sym
    }

    pub fn code_type(&self) -> CodeType {
        self.code
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn level(&self) -> EccLevel {
        self.level
    }

    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    pub fn eci(&self) -> EciCode {
        self.eci
    }

    fn use_version(&mut self, v: Version) {
        self.version = v;
        self.canvas.symbol_width = v.width();
        self.canvas.symbol_height = v.height();
    }

    pub fn set_version(&mut self, v: Version) -> Result<usize, QrError> {
        if v.code_type() != self.code {
            return Err(QrError::InvalidParameter("version"));
        }
        self.use_version(v);
        self.auto_version = false;
        Ok(0)
    }

    pub fn set_auto_version(&mut self) {
        self.auto_version = true;
    }

    pub fn set_level(&mut self, level: EccLevel) {
        self.level = level;
    }

    pub fn set_mask(&mut self, mask: MaskPattern) {
        self.mask = mask;
    }

    pub fn set_eci(&mut self, eci: EciCode) {
        self.eci = eci;
    }

    pub(crate) fn set_symbol_width(&mut self, w: u16) {
        self.canvas.symbol_width = w;
    }

    fn mask_num(&self) -> u8 {
        match self.mask {
            MaskPattern::Pattern(p) => p,
            MaskPattern::Auto => 0,
        }
    }

    pub(crate) fn ctx(&self) -> SymCtx {
        SymCtx {
            w: self.canvas.symbol_width as i32,
            h: self.canvas.symbol_height as i32,
            stride: self.canvas.stride,
            version: self.version,
            mask: self.mask_num(),
        }
    }

    /// the raw canvas stream in storage order (linear for the barcodes)
    pub(crate) fn linear_stream(&mut self) -> BitStream<Canvas> {
        BitStream::new(&mut self.canvas)
    }

    fn composed_iter(&self) -> Option<PosIter<'static>> {
        let ctx = self.ctx();
        match self.code {
            CodeType::Qr => Some(code_qr::composed_data_iter(ctx)),
            CodeType::MicroQr => Some(code_mqr::composed_data_iter(ctx)),
            CodeType::Rmqr => Some(code_rmqr::composed_data_iter(ctx)),
            CodeType::Tqr => Some(code_tqr::composed_data_iter(ctx)),
            _ => None,
        }
    }

    fn format_iter(&self) -> Option<(PosIter<'static>, u32)> {
        let ctx = self.ctx();
        match self.code {
            CodeType::Qr => Some((code_qr::format_info_iter(ctx), code_qr::FORMAT_INFO_SIZE)),
            CodeType::MicroQr => Some((code_mqr::format_info_iter(ctx), code_mqr::FORMAT_INFO_SIZE)),
            CodeType::Rmqr => Some((code_rmqr::format_info_iter(ctx), code_rmqr::FORMAT_INFO_SIZE)),
            _ => None,
        }
    }

    fn pattern_of(&self, p: QrPattern) -> Option<(PosIter<'static>, &'static [u8], u32)> {
        let ctx = self.ctx();
        match (self.code, p) {
            (CodeType::Qr, QrPattern::Finder) => {
                Some((code_qr::finder_pattern_iter(ctx), &code_qr::FINDER_PATTERN_BITS, code_qr::FINDER_PATTERN_SIZE))
            }
            (CodeType::Qr, QrPattern::Alignment) => Some((
                code_qr::alignment_pattern_iter(ctx),
                &code_qr::ALIGNMENT_PATTERN_BITS,
                code_qr::ALIGNMENT_PATTERN_SIZE,
            )),
            (CodeType::Qr, QrPattern::Timing) | (CodeType::Tqr, QrPattern::Timing) => {
                Some((code_qr::timing_pattern_iter(ctx), &code_qr::TIMING_PATTERN_BITS, 8))
            }
            (CodeType::Tqr, QrPattern::Finder) => {
                Some((code_tqr::finder_pattern_iter(ctx), &code_qr::FINDER_PATTERN_BITS, code_qr::FINDER_PATTERN_SIZE))
            }
            (CodeType::MicroQr, QrPattern::Finder) => {
                Some((code_mqr::finder_pattern_iter(ctx), &code_qr::FINDER_PATTERN_BITS, code_qr::FINDER_PATTERN_SIZE))
            }
            (CodeType::MicroQr, QrPattern::Timing) => {
                Some((code_mqr::timing_pattern_iter(ctx), &code_qr::TIMING_PATTERN_BITS, 8))
            }
            (CodeType::Rmqr, QrPattern::Finder) => {
                Some((code_rmqr::finder_pattern_iter(ctx), &code_qr::FINDER_PATTERN_BITS, code_qr::FINDER_PATTERN_SIZE))
            }
            (CodeType::Rmqr, QrPattern::FinderSub) => Some((
                code_rmqr::finder_sub_pattern_iter(ctx),
                &code_rmqr::FINDER_SUB_PATTERN_BITS,
                code_rmqr::FINDER_SUB_PATTERN_SIZE,
            )),
            (CodeType::Rmqr, QrPattern::CornerFinder) => Some((
                code_rmqr::corner_finder_pattern_iter(ctx),
                &code_rmqr::CORNER_FINDER_PATTERN_BITS,
                code_rmqr::CORNER_FINDER_PATTERN_SIZE,
            )),
            (CodeType::Rmqr, QrPattern::Alignment) => Some((
                code_rmqr::alignment_pattern_iter(ctx),
                &code_rmqr::ALIGNMENT_PATTERN_BITS,
                code_rmqr::ALIGNMENT_PATTERN_SIZE,
            )),
            (CodeType::Rmqr, QrPattern::Timing) => {
                Some((code_rmqr::timing_pattern_iter(ctx), &code_qr::TIMING_PATTERN_BITS, 8))
            }
            _ => None,
        }
    }

    fn paint_pattern(&mut self, p: QrPattern) {
        if let Some((it, bits, size)) = self.pattern_of(p) {
            let mut bs = BitStream::with_iter(&mut self.canvas, it);
            bs.write_pattern(bits, size);
        }
    }

    /// bits of disagreement between the canvas and the pattern template;
    /// `idx` probes a single copy, `None` sweeps them all
    pub fn read_pattern_error(&mut self, p: QrPattern, idx: Option<u32>) -> u32 {
        let (it, bits, size) = match self.pattern_of(p) {
            Some(v) => v,
            None => return 0,
        };
        let mut bs = BitStream::with_iter(&mut self.canvas, it);

        let pattern_bit = |i: u32| bits[(i / 8) as usize] & (0x80 >> (i % 8)) != 0;
        let mut errors = 0;
        match idx {
            Some(n) => {
                bs.seek(n * size);
                for i in 0..size {
                    if bs.is_end() {
                        break;
                    }
                    if bs.read_bit() != pattern_bit(i) {
                        errors += 1;
                    }
                }
            }
            None => {
                let mut i = 0;
                while !bs.is_end() {
                    if bs.read_bit() != pattern_bit(i % size) {
                        errors += 1;
                    }
                    i += 1;
                }
            }
        }
        errors
    }

    pub fn write_format_info(&mut self) {
        let fi = match FormatInfo::encode(self.version, self.level, self.mask_num()) {
            Some(fi) => fi,
            None => return,
        };
        if let Some((it, size)) = self.format_iter() {
            let mut bs = BitStream::with_iter(&mut self.canvas, it);
            bs.write_bits(fi.value, size);
            bs.write_bits(fi.value, size);
        }

        // the lone dark module below the top-left finder
        if self.code == CodeType::Qr {
            let h = self.canvas.symbol_height as i32;
            self.canvas.write_pixel(8, h - 8, true);
        }
    }

    pub fn read_format_info(&mut self) -> Option<FormatInfo> {
        let (it, size) = self.format_iter()?;
        let kind = self.code;
        let mut bs = BitStream::with_iter(&mut self.canvas, it);
        let v1 = bs.read_bits(size);
        let v2 = bs.read_bits(size);
        FormatInfo::decode(kind, v1).or_else(|| FormatInfo::decode(kind, v2))
    }

    /// adopt level, mask (and for mQR / rMQR the version) from a decoded
    /// format word
    pub fn set_format_info(&mut self, fi: FormatInfo) {
        if let Some(v) = fi.version {
            self.use_version(v);
        }
        self.level = fi.level;
        self.mask = MaskPattern::Pattern(fi.mask);
    }

    pub fn write_version_info(&mut self) {
        let v = match self.version {
            Version::Qr(v) => v,
            _ => return,
        };
        if let Some(vi) = VersionInfo::encode(v) {
            let it = code_qr::version_info_iter(self.ctx());
            let mut bs = BitStream::with_iter(&mut self.canvas, it);
            bs.write_bits(vi.value, code_qr::VERSION_INFO_SIZE);
            bs.write_bits(vi.value, code_qr::VERSION_INFO_SIZE);
        }
    }

    pub fn read_version_info(&mut self) -> Option<VersionInfo> {
        match self.version {
            Version::Qr(v) if v >= 7 => {
                let it = code_qr::version_info_iter(self.ctx());
                let mut bs = BitStream::with_iter(&mut self.canvas, it);
                let v1 = bs.read_bits(code_qr::VERSION_INFO_SIZE);
                let v2 = bs.read_bits(code_qr::VERSION_INFO_SIZE);
                VersionInfo::decode(v1).or_else(|| VersionInfo::decode(v2))
            }
            Version::Qr(v) => Some(VersionInfo { value: 0, version: v }),
            _ => None,
        }
    }

    /// all function patterns plus format and version info
    pub fn write_frame(&mut self) {
        match self.code {
            CodeType::Qr => {
                self.paint_pattern(QrPattern::Finder);
                self.paint_pattern(QrPattern::Alignment);
                self.paint_pattern(QrPattern::Timing);
                self.write_format_info();
                self.write_version_info();
            }
            CodeType::MicroQr => {
                self.paint_pattern(QrPattern::Finder);
                self.paint_pattern(QrPattern::Timing);
                self.write_format_info();
            }
            CodeType::Rmqr => {
                self.paint_pattern(QrPattern::Finder);
                self.paint_pattern(QrPattern::FinderSub);
                self.paint_pattern(QrPattern::CornerFinder);
                self.paint_pattern(QrPattern::Alignment);
                self.paint_pattern(QrPattern::Timing);
                self.write_format_info();
            }
            CodeType::Tqr => {
                self.paint_pattern(QrPattern::Finder);
                self.paint_pattern(QrPattern::Timing);
            }
            _ => {}
        }
    }

    pub fn write_payload(&mut self, payload: &mut Payload) -> u32 {
        let it = match self.composed_iter() {
            Some(it) => it,
            None => return 0,
        };
        let mut dst = BitStream::with_iter(&mut self.canvas, it);
        let mut src = payload.bitstream();
        bitstream::copy(&mut dst, &mut src)
    }

    pub fn read_payload(&mut self, payload: &mut Payload) -> u32 {
        let it = match self.composed_iter() {
            Some(it) => it,
            None => return 0,
        };
        let mut src = BitStream::with_iter(&mut self.canvas, it);
        let mut dst = payload.bitstream();
        bitstream::copy(&mut dst, &mut src)
    }

    /// RS-decode the payload in place; returns corrected symbol count
    pub fn fix_errors(&mut self) -> Result<usize, QrError> {
        let mut payload = Payload::new(self.version, self.level)?;
        self.read_payload(&mut payload);
        let n = payload.fix_errors()?;
        if n > 0 {
            self.write_payload(&mut payload);
        }
        Ok(n)
    }

    pub fn compute_score(&self) -> u32 {
        if self.code == CodeType::Qr {
            masking::score(&self.canvas)
        } else {
            0
        }
    }

    fn valid_combination(&self, version: Version, level: EccLevel, mask: MaskPattern) -> bool {
        let mask_ok = match mask {
            MaskPattern::Auto => true,
            MaskPattern::Pattern(p) => p < masking::mask_count(self.code),
        };
        if !mask_ok {
            return false;
        }
        match version {
            Version::Qr(_) => true,
            Version::Micro(_) => tables::MICRO_CAPACITY_TABLE.contains_key(&SymbolConfig::new(version, level)),
            Version::Rect(_) => matches!(level, EccLevel::M | EccLevel::H),
            Version::Tqr => true,
        }
    }

    fn version_candidates(&self) -> Vec<Version> {
        if !self.auto_version {
            return vec![self.version];
        }
        match self.code {
            CodeType::Qr => (1..=40).map(Version::Qr).collect(),
            CodeType::MicroQr => (1..=4).map(Version::Micro).collect(),
            CodeType::Rmqr => (0..30).map(Version::Rect).collect(),
            CodeType::Tqr => vec![Version::Tqr],
            _ => Vec::new(),
        }
    }

    fn try_write_qr_data(&mut self, buf: &[u8], data_type: DataType) -> Result<u32, QrError> {
        let mut payload = Payload::new(self.version, self.level)?;

        let mut w = bitcoding::SegmentWriter::new(self.version, payload.data_bits(), self.eci);
        let consumed = match data_type {
            DataType::Auto => w.write_auto(buf),
            DataType::Numeric => w.write_numeric(buf, buf.len()),
            DataType::Alnum => w.write_alnum(buf, buf.len()),
            DataType::Bytes => w.write_bytes(buf, buf.len()),
            DataType::Kanji => w.write_kanji(buf, buf.len()),
        };
        if consumed != buf.len() {
            return Err(QrError::CapacityExceeded);
        }
        let words = w.finalize().ok_or(QrError::CapacityExceeded)?;

        payload.write_data_words(&words);
        payload.set_error_words();

        let chosen = match self.mask {
            MaskPattern::Pattern(p) => p,
            MaskPattern::Auto => {
                let mut min_mask = 0;
                let mut min_score = u32::max_value();
                for m in 0..masking::mask_count(self.code) {
                    if !self.valid_combination(self.version, self.level, MaskPattern::Pattern(m)) {
                        continue;
                    }
                    self.mask = MaskPattern::Pattern(m);
                    self.write_frame();
                    self.write_payload(&mut payload);
                    let score = self.compute_score();
                    if score < min_score {
                        min_score = score;
                        min_mask = m;
                    }
                }
                min_mask
            }
        };

        self.mask = MaskPattern::Pattern(chosen);
        self.write_frame();
        Ok(self.write_payload(&mut payload))
    }

    fn write_qr_data(&mut self, buf: &[u8], data_type: DataType) -> Result<usize, QrError> {
        let requested_mask = self.mask;
        for v in self.version_candidates() {
            if !self.valid_combination(v, self.level, requested_mask) {
                continue;
            }
            self.use_version(v);
            self.mask = requested_mask;
            match self.try_write_qr_data(buf, data_type) {
                Ok(bits) => {
                    debug!("encoded as {} {}", self.code.name(), self.version.to_string());
                    return Ok((bits / 8) as usize);
                }
                Err(_) => continue,
            }
        }
        Err(QrError::CapacityExceeded)
    }

    /// Encode `data` into the symbol. With version or mask on automatic,
    /// picks the smallest version that fits and the best-scoring mask.
    /// Returns the payload size in bytes.
    pub fn write_buffer(&mut self, data: &[u8], data_type: DataType) -> Result<usize, QrError> {
        match self.code {
            CodeType::Ean13 | CodeType::Ean8 | CodeType::UpcA => code_ean::write_data(self, data),
            CodeType::Code39 => code_code39::write_data(self, data),
            CodeType::Code93 => code_code93::write_data(self, data),
            CodeType::Itf => code_itf::write_data(self, data),
            CodeType::Nw7 => code_nw7::write_data(self, data),
            _ => self.write_qr_data(data, data_type),
        }
    }

    pub fn write_string(&mut self, data: &str, data_type: DataType) -> Result<usize, QrError> {
        self.write_buffer(data.as_bytes(), data_type)
    }

    /// parse the payload of the current symbol without touching format
    /// info or error correction (the detector drives those itself)
    pub fn read_qr_data(&mut self) -> Result<Vec<u8>, QrError> {
        let mut payload = Payload::new(self.version, self.level)?;
        self.read_payload(&mut payload);
        let words = payload.read_data_words();
        Ok(bitcoding::parse(&words, payload.data_bits(), self.version, self.eci))
    }

    /// Full decode of the canvas: recover format info (and check version
    /// info), fix errors, parse segments.
    pub fn read_buffer(&mut self) -> Result<Vec<u8>, QrError> {
        match self.code {
            CodeType::Ean13 | CodeType::Ean8 | CodeType::UpcA => return code_ean::read_data(self),
            CodeType::Code39 => return code_code39::read_data(self),
            CodeType::Code93 => return code_code93::read_data(self),
            CodeType::Itf => return code_itf::read_data(self),
            CodeType::Nw7 => return code_nw7::read_data(self),
            _ => {}
        }

        if self.code == CodeType::Tqr {
            self.mask = MaskPattern::Pattern(0);
        } else {
            let fi = self.read_format_info().ok_or(QrError::DecodeMismatch)?;
            self.set_format_info(fi);
            if let Version::Qr(v) = self.version {
                if v >= 7 {
                    let vi = self.read_version_info().ok_or(QrError::DecodeMismatch)?;
                    if vi.version != v {
                        return Err(QrError::DecodeMismatch);
                    }
                }
            }
        }

        self.fix_errors()?;
        self.read_qr_data()
    }

    pub fn read_string(&mut self) -> Result<String, QrError> {
        Ok(String::from_utf8_lossy(&self.read_buffer()?).into_owned())
    }

    pub fn write_pixel(&mut self, x: i32, y: i32, v: bool) {
        self.canvas.write_pixel(x, y, v);
    }

    pub fn read_pixel(&self, x: i32, y: i32) -> bool {
        self.canvas.read_pixel(x, y)
    }

    /// copy every module from a pixel source (e.g. a perspective-warped
    /// image sampler) into the canvas
    pub fn sample_from(&mut self, src: &dyn PixelSource) {
        for y in 0..self.canvas.symbol_height as i32 {
            for x in 0..self.canvas.symbol_width as i32 {
                let v = src.read_pixel(x, y);
                self.canvas.write_pixel(x, y, v);
            }
        }
    }

    /// blit the symbol into any pixel sink, e.g. an external framebuffer
    pub fn render_to(&self, sink: &mut dyn PixelSink) {
        for y in 0..self.canvas.symbol_height as i32 {
            for x in 0..self.canvas.symbol_width as i32 {
                sink.write_pixel(x, y, self.read_pixel(x, y));
            }
        }
    }

    fn bitmap_iter(&self) -> PosIter<'static> {
        let ctx = self.ctx();
        let pad = self.canvas.bitmap_padding;
        let scale = self.canvas.bitmap_scale as u32;
        let bw = self.canvas.bitmap_width();
        let bh = self.canvas.bitmap_height();
        Box::new(move |i| {
            if i >= bw * bh * scale * scale {
                return crate::bitstream::BitPos::End;
            }
            let x = (i / scale % bw) as i32 - pad.l as i32;
            let y = (i / scale / bw / scale) as i32 - pad.t as i32;
            ctx.xyv(x, y, false)
        })
    }

    /// export the padded, scaled bitmap at `bpp` bits per pixel using the
    /// configured dark / light colours
    pub fn read_bitmap(&mut self, bpp: u32) -> Vec<u8> {
        let bw = self.canvas.bitmap_width() * self.canvas.bitmap_scale as u32;
        let bh = self.canvas.bitmap_height() * self.canvas.bitmap_scale as u32;
        let dark = self.canvas.dark_color;
        let light = self.canvas.light_color;

        let mut out = BitBuffer::new(bw * bh * bpp);
        let it = self.bitmap_iter();
        let mut src = BitStream::with_iter(&mut self.canvas, it);
        let mut dst = BitStream::new(&mut out);
        while !src.is_end() && !dst.is_end() {
            let v = if src.read_bit() { dark } else { light };
            dst.write_bits(v, bpp);
        }
        drop(dst);
        out.bytes().to_vec()
    }

    /// import a bitmap; any non-zero pixel value counts as light
    pub fn write_bitmap(&mut self, data: &[u8], bpp: u32) {
        let mut buf = BitBuffer::from_bytes(data);
        let it = self.bitmap_iter();
        let mut dst = BitStream::with_iter(&mut self.canvas, it);
        let mut src = BitStream::new(&mut buf);
        while !src.is_end() && !dst.is_end() {
            let v = src.read_bits(bpp) == 0;
            dst.write_bit(v);
        }
    }

    pub fn to_image(&self) -> image::GrayImage {
        self.canvas.to_image()
    }

    /// terminal rendering with Unicode half blocks, light modules lit
    pub fn dump(&self, out: &mut dyn std::fmt::Write) {
        let dots = ["\u{2588}", "\u{2580}", "\u{2584}", " "];

        let pad = self.canvas.bitmap_padding;
        let sx = -(pad.l as i32);
        let sy = -(pad.t as i32);
        let ex = self.canvas.symbol_width as i32 + pad.r as i32;
        let ey = self.canvas.symbol_height as i32 + pad.b as i32;

        let mut y = sy;
        while y < ey {
            for x in sx..ex {
                let u = self.read_pixel(x, y) as usize;
                let l = if y + 1 >= ey { 1 } else { self.read_pixel(x, y + 1) as usize };
                let _ = out.write_str(dots[(u << 1 | l) & 3]);
            }
            let _ = out.write_str("\n");
            y += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world_roundtrip() {
        let mut sym = Symbol::new(CodeType::Qr);
        let written = sym.write_string("Hello, world", DataType::Auto).unwrap();
        assert!(written > 0);
        assert_eq!(sym.version(), Version::Qr(1));
        assert_eq!(sym.canvas.symbol_width, 21);
        assert_eq!(sym.read_string().unwrap(), "Hello, world");
    }

    #[test]
    fn test_url_picks_version_3() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("https://github.com/kikuchan/libqrean", DataType::Auto).unwrap();
        assert_eq!(sym.version(), Version::Qr(3));
        assert_eq!(sym.canvas.symbol_width, 29);
        assert_eq!(sym.read_string().unwrap(), "https://github.com/kikuchan/libqrean");
    }

    #[test]
    fn test_fix_errors_recovers_flipped_module() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("https://github.com/kikuchan/libqrean", DataType::Auto).unwrap();

        let w = sym.canvas.symbol_width as i32;
        let h = sym.canvas.symbol_height as i32;
        let v = sym.read_pixel(w - 1, h - 1);
        sym.write_pixel(w - 1, h - 1, !v);

        assert!(sym.fix_errors().unwrap() > 0);
        assert_eq!(sym.read_string().unwrap(), "https://github.com/kikuchan/libqrean");
    }

    #[test]
    fn test_mask_selection_is_deterministic() {
        let masks: Vec<MaskPattern> = (0..3)
            .map(|_| {
                let mut sym = Symbol::new(CodeType::Qr);
                sym.write_string("DETERMINISM", DataType::Auto).unwrap();
                sym.mask()
            })
            .collect();
        assert_eq!(masks[0], masks[1]);
        assert_eq!(masks[1], masks[2]);
        assert!(matches!(masks[0], MaskPattern::Pattern(_)));
    }

    #[test]
    fn test_explicit_version_and_level() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.set_version(Version::Qr(7)).unwrap();
        sym.set_level(EccLevel::Q);
        sym.write_string("FIXED VERSION", DataType::Auto).unwrap();
        assert_eq!(sym.version(), Version::Qr(7));
        // version info must round-trip through the canvas
        assert_eq!(sym.read_version_info().unwrap().version, 7);
        assert_eq!(sym.read_string().unwrap(), "FIXED VERSION");
    }

    #[test]
    fn test_micro_qr_roundtrip() {
        let mut sym = Symbol::new(CodeType::MicroQr);
        sym.set_level(EccLevel::L);
        sym.write_string("12345", DataType::Auto).unwrap();
        assert!(sym.version() <= Version::Micro(2));
        assert_eq!(sym.read_string().unwrap(), "12345");
    }

    #[test]
    fn test_rmqr_roundtrip() {
        let mut sym = Symbol::new(CodeType::Rmqr);
        sym.write_string("RMQR DATA 123", DataType::Auto).unwrap();
        assert!(sym.version().is_rect());
        assert_eq!(sym.read_string().unwrap(), "RMQR DATA 123");
    }

    #[test]
    fn test_tqr_roundtrip() {
        let mut sym = Symbol::new(CodeType::Tqr);
        sym.write_string("123456789012", DataType::Auto).unwrap();
        assert_eq!(sym.read_string().unwrap(), "123456789012");
    }

    #[test]
    fn test_kanji_roundtrip() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.set_eci(EciCode::Utf8);
        sym.write_string("日本語", DataType::Auto).unwrap();
        assert_eq!(sym.version(), Version::Qr(1)); // 3 * 13 bits fits easily
        assert_eq!(sym.read_string().unwrap(), "日本語");
    }

    #[test]
    fn test_too_long_fails_cleanly() {
        let mut sym = Symbol::new(CodeType::MicroQr);
        let err = sym.write_string("this will never fit in a micro qr symbol at all", DataType::Auto);
        assert_eq!(err, Err(QrError::CapacityExceeded));
    }

    #[test]
    fn test_render_to_sink_matches_canvas() {
        struct Grid {
            w: i32,
            cells: Vec<bool>,
        }
        impl crate::canvas::PixelSink for Grid {
            fn write_pixel(&mut self, x: i32, y: i32, v: bool) {
                let i = (y * self.w + x) as usize;
                self.cells[i] = v;
            }
        }

        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("SINK", DataType::Auto).unwrap();
        let mut grid = Grid { w: 21, cells: vec![false; 21 * 21] };
        sym.render_to(&mut grid);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(grid.cells[(y * 21 + x) as usize], sym.read_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_dump_renders_lines() {
        let mut sym = Symbol::new(CodeType::Qr);
        sym.write_string("DUMP", DataType::Auto).unwrap();
        let mut s = String::new();
        sym.dump(&mut s);
        assert_eq!(s.lines().count(), 11); // ceil(21 / 2)
    }
}
