/// Mask predicates for every symbol family and the four-penalty score
/// that drives automatic mask selection for classic QR.

use crate::canvas::Canvas;
use crate::config::CodeType;
use crate::runlength::RunLength;

fn qr_mask(pattern: u8, i: i32, j: i32) -> bool {
    // i is the row, j the column
    match pattern {
        0 => (i + j) % 2 == 0,
        1 => i % 2 == 0,
        2 => j % 3 == 0,
        3 => (i + j) % 3 == 0,
        4 => (i / 2 + j / 3) % 2 == 0,
        5 => (i * j) % 2 + (i * j) % 3 == 0,
        6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
        7 => ((i * j) % 3 + (i + j) % 2) % 2 == 0,
        _ => false,
    }
}

pub fn is_mask(code: CodeType, pattern: u8, x: i32, y: i32) -> bool {
    match code {
        CodeType::Qr | CodeType::Tqr => qr_mask(pattern, y, x),
        // the four micro patterns map to QR patterns 1, 4, 6, 7
        CodeType::MicroQr => match pattern {
            0 => qr_mask(1, y, x),
            1 => qr_mask(4, y, x),
            2 => qr_mask(6, y, x),
            3 => qr_mask(7, y, x),
            _ => false,
        },
        CodeType::Rmqr => qr_mask(4, y, x),
        _ => false,
    }
}

/// how many mask patterns the family defines
pub fn mask_count(code: CodeType) -> u8 {
    match code {
        CodeType::Qr => 8,
        CodeType::MicroQr => 4,
        CodeType::Rmqr | CodeType::Tqr => 1,
        _ => 0,
    }
}

const N1: u32 = 3;
const N2: u32 = 3;
const N3: u32 = 40;
const N4: u32 = 10;

fn check_n3(rl: &RunLength, v: bool) -> bool {
    if !v && rl.match_ratio(&[1, 1, 3, 1, 1, 0]) && rl.get(0) / 4 >= rl.get(1) {
        return true;
    }
    if v && rl.match_ratio(&[0, 1, 1, 3, 1, 1]) && rl.get(5) / 4 >= rl.get(4) {
        return true;
    }
    false
}

/// The QR mask penalty: long runs, 2x2 blocks, finder look-alikes and
/// dark-module balance. Lower is better.
pub fn score(canvas: &Canvas) -> u32 {
    let w = canvas.symbol_width as i32;
    let h = canvas.symbol_height as i32;
    let mut score = 0;
    let mut dark_modules = 0u32;

    for y in 0..h {
        for dir in 0..2 {
            let mut last_v = 2u32;
            let mut rl = RunLength::new();

            for x in 0..w {
                let v = canvas.read_pixel(if dir != 0 { y } else { x }, if dir != 0 { x } else { y }) as u32;

                if last_v != v {
                    if rl.latest() >= 5 {
                        score += rl.latest() - 5 + N1;
                    }
                    if check_n3(&rl, last_v != 0) {
                        score += N3;
                    }
                    rl.next();
                    last_v = v;
                }
                rl.count();

                if dir != 0 {
                    continue;
                }

                if v != 0 {
                    dark_modules += 1;
                }

                let a = [
                    canvas.read_pixel(x, y),
                    canvas.read_pixel(x + 1, y),
                    canvas.read_pixel(x, y + 1),
                    canvas.read_pixel(x + 1, y + 1),
                ];
                if x + 1 < w && y + 1 < h && a[0] == a[1] && a[1] == a[2] && a[2] == a[3] {
                    score += N2;
                }
            }

            if rl.latest() >= 5 {
                score += rl.latest() - 5 + N1;
            }
            if check_n3(&rl, last_v != 0) {
                score += N3;
            }
        }
    }

    let ratio = dark_modules * 100 / (w as u32) / (h as u32);
    if ratio < 50 {
        score += (50 - ratio) / 5 * N4;
    } else {
        score += (ratio - 50) / 5 * N4;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, QR_FAMILY_STRIDE};

    #[test]
    fn test_masks_differ() {
        // each QR pattern must differ from every other somewhere
        for a in 0..8 {
            for b in (a + 1)..8 {
                let mut differs = false;
                for y in 0..12 {
                    for x in 0..12 {
                        if qr_mask(a, y, x) != qr_mask(b, y, x) {
                            differs = true;
                        }
                    }
                }
                assert!(differs, "patterns {} and {} identical", a, b);
            }
        }
    }

    #[test]
    fn test_mask_xor_is_involution() {
        let mut c = Canvas::new(QR_FAMILY_STRIDE);
        c.symbol_width = 21;
        c.symbol_height = 21;
        for y in 0..21 {
            for x in 0..21 {
                c.write_pixel(x, y, (x * 3 + y * 7) % 5 == 0);
            }
        }
        let before: Vec<bool> = (0..21 * 21).map(|i| c.read_pixel(i % 21, i / 21)).collect();

        for _ in 0..2 {
            for y in 0..21 {
                for x in 0..21 {
                    if is_mask(CodeType::Qr, 3, x, y) {
                        let v = c.read_pixel(x, y);
                        c.write_pixel(x, y, !v);
                    }
                }
            }
        }
        let after: Vec<bool> = (0..21 * 21).map(|i| c.read_pixel(i % 21, i / 21)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_solid_canvas_scores_badly() {
        let mut c = Canvas::new(QR_FAMILY_STRIDE);
        c.symbol_width = 21;
        c.symbol_height = 21;
        let solid = score(&c);
        // checkerboard has no long runs or blocks
        for y in 0..21 {
            for x in 0..21 {
                c.write_pixel(x, y, (x + y) % 2 == 0);
            }
        }
        let checker = score(&c);
        assert!(checker < solid);
    }
}
