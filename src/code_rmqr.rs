/// Position iterators for rectangular micro QR: one finder, a sub finder
/// in the opposite corner, corner finders, edge-running timing pattern
/// with interior timing columns, 3x3 alignment rings and the two
/// differently-masked format info copies.

use lazy_static::lazy_static;

use crate::bitstream::{BitPos, PosIter};
use crate::canvas::{SymCtx, QR_FAMILY_STRIDE};
use crate::code_qr;
use crate::config::{CodeType, Version};
use crate::masking;
use crate::tables;

pub const FORMAT_INFO_SIZE: u32 = 18;
pub const FINDER_SUB_PATTERN_SIZE: u32 = 5 * 5;
pub const ALIGNMENT_PATTERN_SIZE: u32 = 3 * 3;
pub const CORNER_FINDER_PATTERN_SIZE: u32 = 6;

pub static FINDER_SUB_PATTERN_BITS: [u8; 4] = [
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

pub static ALIGNMENT_PATTERN_BITS: [u8; 2] = [
    /*
     * 111
     * 101
     * 111
     */
    0b1111_0111,
    0b1000_0000,
];

pub static CORNER_FINDER_PATTERN_BITS: [u8; 1] = [
    /*
     * 111
     * 10
     * 1
     */
    0b1111_0100,
];

fn columns(ctx: &SymCtx) -> &'static [u8] {
    tables::rmqr_alignment_columns(ctx.w as u8)
}

fn alignment_num(ctx: &SymCtx) -> u32 {
    columns(ctx).len() as u32 * 2
}

/// 3x3 rings sit at the top and bottom of each interior timing column
fn alignment_position(ctx: &SymCtx, n: u32) -> (i32, i32) {
    let cx = columns(ctx)[(n / 2) as usize] as i32;
    let cy = if n % 2 == 0 { 1 } else { ctx.h - 2 };
    (cx, cy)
}

fn is_finder_pattern(_ctx: &SymCtx, x: i32, y: i32) -> bool {
    x < 8 && y < 8
}

fn is_finder_sub_pattern(ctx: &SymCtx, x: i32, y: i32) -> bool {
    x >= ctx.w - 5 && y >= ctx.h - 5
}

fn is_corner_finder_pattern(ctx: &SymCtx, x: i32, y: i32) -> bool {
    if 3 >= (ctx.h - y) + x {
        return true;
    }
    if 3 >= (ctx.w - x) + y {
        return true;
    }
    false
}

fn is_horizontal_timing_pattern(ctx: &SymCtx, _x: i32, y: i32) -> bool {
    y == 0 || y == ctx.h - 1
}

fn is_vertical_timing_pattern(ctx: &SymCtx, x: i32, _y: i32) -> bool {
    if x == 0 || x == ctx.w - 1 {
        return true;
    }
    columns(ctx).iter().any(|&c| c as i32 == x)
}

fn is_alignment_pattern(ctx: &SymCtx, x: i32, y: i32) -> bool {
    for n in 0..alignment_num(ctx) {
        let (cx, cy) = alignment_position(ctx, n);
        if cx - 1 <= x && x <= cx + 1 && cy - 1 <= y && y <= cy + 1 {
            return true;
        }
    }
    false
}

fn is_format_info(ctx: &SymCtx, x: i32, y: i32) -> bool {
    if (8..=10).contains(&x) && y <= 5 {
        return true;
    }
    if x == 11 && (0..=3).contains(&y) {
        return true;
    }

    let w = ctx.w;
    let h = ctx.h;
    if (h - 6..h).contains(&y) && (w - 8..w - 8 + 3).contains(&x) {
        return true;
    }
    if h - 6 == y && (w - 8 + 3..w - 8 + 6).contains(&x) {
        return true;
    }

    false
}

pub fn finder_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    code_qr::finder_pattern_iter_n(ctx, 1)
}

pub fn finder_sub_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / FINDER_SUB_PATTERN_SIZE;
        if n >= 1 {
            return BitPos::End;
        }

        let x = ctx.w - 1 - (i % 5) as i32;
        let y = ctx.h - 1 - (i / 5) as i32;

        ctx.xyv(x, y, false)
    })
}

pub fn corner_finder_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / CORNER_FINDER_PATTERN_SIZE;
        let u = (i % CORNER_FINDER_PATTERN_SIZE) as i32;

        if n >= 2 {
            return BitPos::End;
        }

        let mut flip = false;
        let (x, y);
        if n == 0 {
            x = if u < 3 { 0 } else if u < 5 { 1 } else { 2 };
            y = ctx.h - 1 - (if u < 3 { u } else if u < 5 { u - 3 } else { 0 });
            if y == 7 && x == 0 {
                flip = true; // finder pattern white module
            }
        } else {
            x = ctx.w - 1 - (if u < 3 { u } else if u < 5 { u - 3 } else { 0 });
            y = if u < 3 { 0 } else if u < 5 { 1 } else { 2 };
        }

        ctx.xyv(x, y, flip)
    })
}

pub fn timing_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let w = ctx.w;
        let h = ctx.h;
        let mut i = i as i32;

        // top edge
        if i < w - 8 - 3 {
            let x = i + 8;
            return ctx.xyv(x, 0, is_vertical_timing_pattern(&ctx, x, 0));
        }
        i -= w - 8 - 3;

        // bottom edge
        let ox = if h > 2 + 5 { 2 } else { 8 };
        if i < w - ox - 5 {
            let x = i + ox;
            return ctx.xyv(x, h - 1, is_vertical_timing_pattern(&ctx, x, h - 1));
        }
        i -= w - ox - 5;

        // left edge
        if h > 8 + 3 {
            if i < h - 8 - 3 {
                return ctx.xyv(0, i + 8, false);
            }
            i -= h - 8 - 3;
        }

        // right edge
        if h > 2 + 5 {
            if i < h - 2 - 5 {
                return ctx.xyv(w - 1, i + 2, false);
            }
            i -= h - 2 - 5;
        }

        // interior timing columns
        let n = i / (h - 1);
        let y = i % (h - 1);
        if n as usize >= columns(&ctx).len() {
            return BitPos::End;
        }
        ctx.xyv(columns(&ctx)[n as usize] as i32, y, false)
    })
}

pub fn alignment_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / ALIGNMENT_PATTERN_SIZE;
        if alignment_num(&ctx) <= n {
            return BitPos::End;
        }

        let (cx, cy) = alignment_position(&ctx, n);
        ctx.xyv(cx - 1 + (i % 3) as i32, cy - 1 + (i / 3 % 3) as i32, false)
    })
}

pub fn format_info_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / FORMAT_INFO_SIZE;
        let u = (FORMAT_INFO_SIZE - 1 - i % FORMAT_INFO_SIZE) as i32;

        if n == 0 {
            let x = 8 + u / 5;
            let y = 1 + u % 5;
            ctx.xyv(x, y, 0x1FAB2 & (1 << u) != 0)
        } else if n == 1 {
            let (x, y);
            if u < 15 {
                x = ctx.w - 8 + u / 5;
                y = ctx.h - 6 + u % 5;
            } else {
                x = ctx.w - 8 + (u - 12);
                y = ctx.h - 6;
            }
            ctx.xyv(x, y, 0x20A7B & (1 << u) != 0)
        } else {
            BitPos::End
        }
    })
}

pub fn composed_data_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let w = ctx.w;
        let h = ctx.h;
        let i = i as i32;
        let x = (w - 1) - (i % 2) - 2 * (i / (2 * h)) - 1;
        let y = if i % (4 * h) < 2 * h { (h - 1) - (i / 2 % (2 * h)) } else { -h + (i / 2 % (2 * h)) };

        if x < 0 || y < 0 {
            return BitPos::End;
        }

        if is_finder_pattern(&ctx, x, y)
            || is_finder_sub_pattern(&ctx, x, y)
            || is_corner_finder_pattern(&ctx, x, y)
            || is_alignment_pattern(&ctx, x, y)
            || is_vertical_timing_pattern(&ctx, x, y)
            || is_horizontal_timing_pattern(&ctx, x, y)
            || is_format_info(&ctx, x, y)
        {
            return BitPos::Trunc;
        }

        let v = masking::is_mask(CodeType::Rmqr, ctx.mask, x, y);
        ctx.xyv(x, y, v)
    })
}

pub(crate) fn ctx_for(index: u8) -> SymCtx {
    let v = Version::Rect(index);
    SymCtx {
        w: v.width() as i32,
        h: v.height() as i32,
        stride: QR_FAMILY_STRIDE,
        version: v,
        mask: 0,
    }
}

lazy_static! {
    static ref AVAILABLE_BITS: [u32; 30] = {
        let mut tbl = [0u32; 30];
        for (i, slot) in tbl.iter_mut().enumerate() {
            let it = composed_data_iter(ctx_for(i as u8));
            let mut count = 0;
            let mut n = 0;
            loop {
                match it(n) {
                    BitPos::End => break,
                    BitPos::At { .. } => count += 1,
                    _ => {}
                }
                n += 1;
            }
            *slot = count;
        }
        tbl
    };
}

/// module budget of an rMQR version, counted off its own data walk
pub fn available_bits(index: u8) -> u32 {
    AVAILABLE_BITS[index as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_budgets_are_sane() {
        // every version must hold at least a few codewords, and capacity
        // must grow with area
        for i in 0..30u8 {
            let bits = available_bits(i);
            assert!(bits >= 60, "R{:?} too small: {}", tables::RMQR_DIMS[i as usize], bits);
        }
        assert!(available_bits(29) > available_bits(0));
    }

    #[test]
    fn test_walk_positions_unique_and_clear_of_functions() {
        for &i in &[0u8, 7, 14, 29] {
            let ctx = ctx_for(i);
            let it = composed_data_iter(ctx);
            let mut seen = HashSet::new();
            let mut n = 0;
            loop {
                match it(n) {
                    BitPos::End => break,
                    BitPos::At { pos, .. } => {
                        assert!(seen.insert(pos));
                        let x = (pos % QR_FAMILY_STRIDE) as i32;
                        let y = (pos / QR_FAMILY_STRIDE) as i32;
                        assert!(!is_format_info(&ctx, x, y));
                        assert!(!is_finder_pattern(&ctx, x, y));
                    }
                    _ => {}
                }
                n += 1;
            }
        }
    }

    #[test]
    fn test_format_copies_18_bits_each() {
        let it = format_info_iter(ctx_for(0));
        let mut n = 0;
        while it(n) != BitPos::End {
            n += 1;
        }
        assert_eq!(n, 36);
    }

    #[test]
    fn test_alignment_rings_touch_top_and_bottom() {
        let ctx = ctx_for(5); // R9x43, one column at 21
        assert_eq!(alignment_num(&ctx), 2);
        assert_eq!(alignment_position(&ctx, 0), (21, 1));
        assert_eq!(alignment_position(&ctx, 1), (21, 7));
    }
}
