/// Position iterators for classic QR: the three finders, timing row and
/// column, alignment grid, the two format info copies, version info and
/// the zig-zag composed data walk. Function-pattern modules surface as
/// `Trunc` from the data walk; the mask value rides on the toggle flag.

use crate::bitstream::{BitPos, PosIter};
use crate::canvas::SymCtx;
use crate::config::{CodeType, Version};
use crate::masking;
use crate::tables;

pub const FINDER_PATTERN_SIZE: u32 = 9 * 9;
pub const ALIGNMENT_PATTERN_SIZE: u32 = 5 * 5;
pub const FORMAT_INFO_SIZE: u32 = 15;
pub const VERSION_INFO_SIZE: u32 = 18;

pub static FINDER_PATTERN_BITS: [u8; 11] = [
    /*
     * 000000000
     * 011111110
     * 010000010
     * 010111010
     * 010111010
     * 010111010
     * 010000010
     * 011111110
     * 000000000
     */
    0b0000_0000,
    0b0011_1111,
    0b1001_0000,
    0b0100_1011,
    0b1010_0101,
    0b1101_0010,
    0b1110_1001,
    0b0000_0100,
    0b1111_1110,
    0b0000_0000,
    0b0000_0000,
];

pub static ALIGNMENT_PATTERN_BITS: [u8; 4] = [
    /*
     * 11111
     * 10001
     * 10101
     * 10001
     * 11111
     */
    0b1111_1100,
    0b0110_1011,
    0b0001_1111,
    0b1000_0000,
];

pub static TIMING_PATTERN_BITS: [u8; 1] = [0xAA];

fn qr_version(ctx: &SymCtx) -> u8 {
    match ctx.version {
        Version::Qr(v) => v,
        _ => 1,
    }
}

pub(crate) fn is_finder_pattern(ctx: &SymCtx, x: i32, y: i32) -> bool {
    if x < 8 && y < 8 {
        return true;
    }
    if x < 8 && y >= ctx.h - 8 {
        return true;
    }
    if x >= ctx.w - 8 && y < 8 {
        return true;
    }
    false
}

pub(crate) fn is_timing_pattern(_ctx: &SymCtx, x: i32, y: i32) -> bool {
    x == 6 || y == 6
}

fn is_alignment_pattern(ctx: &SymCtx, x: i32, y: i32) -> bool {
    let v = qr_version(ctx);
    for n in 0..tables::qr_alignment_num(v) {
        let (cx, cy) = tables::qr_alignment_position(v, n);
        let (cx, cy) = (cx as i32, cy as i32);
        if cx - 2 <= x && x <= cx + 2 && cy - 2 <= y && y <= cy + 2 {
            return true;
        }
    }
    false
}

fn is_format_info(ctx: &SymCtx, x: i32, y: i32) -> bool {
    if y == 8 && ((0..=8).contains(&x) || (ctx.w - 8..ctx.w).contains(&x)) {
        return true;
    }
    if x == 8 && ((0..=8).contains(&y) || (ctx.h - 8..ctx.h).contains(&y)) {
        return true;
    }
    false
}

fn is_version_info(ctx: &SymCtx, x: i32, y: i32) -> bool {
    if qr_version(ctx) < 7 {
        return false;
    }
    if x < 7 && (ctx.h - 11..=ctx.h - 9).contains(&y) {
        return true;
    }
    if y < 7 && (ctx.w - 11..=ctx.w - 9).contains(&x) {
        return true;
    }
    false
}

/// the 9x9 finder square(s) including the separator ring; shared with the
/// smaller families which only carry the top-left copy
pub(crate) fn finder_pattern_iter_n(ctx: SymCtx, copies: u32) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / FINDER_PATTERN_SIZE;
        if n >= copies {
            return BitPos::End;
        }
        let x = (i % 9) as i32 + if n == 1 { ctx.w - 8 } else { -1 };
        let y = (i / 9 % 9) as i32 + if n == 2 { ctx.h - 8 } else { -1 };
        ctx.xyv(x, y, false)
    })
}

pub fn finder_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    finder_pattern_iter_n(ctx, 3)
}

pub fn timing_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let period = (ctx.w - 7 * 2 - 1) as u32;
        let n = i / period % period;
        let u = (i % period) as i32;

        if n >= 2 {
            return BitPos::End;
        }
        if u > ctx.w - 8 * 2 {
            return BitPos::Trunc;
        }
        ctx.xyv(if n == 0 { 7 + u } else { 6 }, if n != 0 { 7 + u } else { 6 }, true)
    })
}

pub fn alignment_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let v = qr_version(&ctx);
        let n = i / ALIGNMENT_PATTERN_SIZE;
        if tables::qr_alignment_num(v) <= n {
            return BitPos::End;
        }

        let (cx, cy) = tables::qr_alignment_position(v, n);
        if cx == 0 || cy == 0 {
            return BitPos::Trunc;
        }

        ctx.xyv(cx as i32 - 2 + (i % 5) as i32, cy as i32 - 2 + (i / 5 % 5) as i32, false)
    })
}

pub fn format_info_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / FORMAT_INFO_SIZE;
        let u = (i % FORMAT_INFO_SIZE) as i32;

        if n >= 2 {
            return BitPos::End;
        }

        let x = if n != 0 {
            8
        } else if u <= 5 {
            u
        } else if u == 6 {
            7
        } else {
            ctx.w + u - 15
        };
        let y = if n == 0 {
            8
        } else if u <= 6 {
            ctx.h - 1 - u
        } else if u <= 8 {
            15 - u
        } else {
            14 - u
        };

        ctx.xyv(x, y, 0x5412 & (0x4000 >> u) != 0)
    })
}

pub fn version_info_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        if qr_version(&ctx) < 7 {
            return BitPos::End;
        }

        let n = i / VERSION_INFO_SIZE;
        let u = (i % VERSION_INFO_SIZE) as i32;

        if n >= 2 {
            return BitPos::End;
        }

        let x = if n == 0 { 5 - u / 3 } else { ctx.w - 9 - u % 3 };
        let y = if n == 0 { ctx.h - 9 - u % 3 } else { 5 - u / 3 };

        ctx.xyv(x, y, false)
    })
}

/// The zig-zag data walk: column pairs right to left, alternating up and
/// down, skipping the timing column and every function module.
pub fn composed_data_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let w = ctx.w;
        let h = ctx.h;
        let i = i as i32;
        let x = (w - 1) - (i % 2) - 2 * (i / (2 * h)) - if i >= (w - 7) * h { 1 } else { 0 };
        let y = if i % (4 * h) < 2 * h { (h - 1) - (i / 2 % (2 * h)) } else { -h + (i / 2 % (2 * h)) };

        if x < 0 || y < 0 {
            return BitPos::End;
        }

        // avoid function patterns
        if is_finder_pattern(&ctx, x, y)
            || is_alignment_pattern(&ctx, x, y)
            || is_timing_pattern(&ctx, x, y)
            || is_format_info(&ctx, x, y)
            || is_version_info(&ctx, x, y)
        {
            return BitPos::Trunc;
        }

        let v = masking::is_mask(CodeType::Qr, ctx.mask, x, y);
        ctx.xyv(x, y, v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::QR_FAMILY_STRIDE;

    fn ctx(version: u8) -> SymCtx {
        let v = Version::Qr(version);
        SymCtx {
            w: v.width() as i32,
            h: v.height() as i32,
            stride: QR_FAMILY_STRIDE,
            version: v,
            mask: 0,
        }
    }

    fn count_data_modules(ctx: SymCtx) -> u32 {
        let it = composed_data_iter(ctx);
        let mut count = 0;
        let mut i = 0;
        loop {
            match it(i) {
                BitPos::End => break,
                BitPos::At { .. } => count += 1,
                _ => {}
            }
            i += 1;
        }
        count
    }

    #[test]
    fn test_walk_matches_module_budget() {
        for &v in &[1u8, 2, 6, 7, 14, 21, 40] {
            assert_eq!(count_data_modules(ctx(v)), tables::qr_available_bits(v), "version {}", v);
        }
    }

    #[test]
    fn test_walk_never_repeats_a_position() {
        let it = composed_data_iter(ctx(2));
        let mut seen = std::collections::HashSet::new();
        let mut i = 0;
        loop {
            match it(i) {
                BitPos::End => break,
                BitPos::At { pos, .. } => {
                    assert!(seen.insert(pos), "position {} visited twice", pos);
                }
                _ => {}
            }
            i += 1;
        }
    }

    #[test]
    fn test_finder_iter_covers_three_corners() {
        let it = finder_pattern_iter(ctx(1));
        // the outer white ring of the second copy hangs off the canvas
        assert_eq!(it(FINDER_PATTERN_SIZE), BitPos::Blank);
        // second row, first column of the top-right copy
        match it(FINDER_PATTERN_SIZE + 9) {
            BitPos::At { pos, .. } => assert_eq!(pos, 21 - 8),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(it(3 * FINDER_PATTERN_SIZE), BitPos::End);
    }

    #[test]
    fn test_format_iter_yields_30_positions() {
        let it = format_info_iter(ctx(1));
        let mut n = 0;
        while it(n) != BitPos::End {
            n += 1;
        }
        assert_eq!(n, 30);
    }
}
