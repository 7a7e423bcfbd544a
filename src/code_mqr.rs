/// Position iterators for micro QR: one finder, timing along the top and
/// left edges, a single format info copy.

use crate::bitstream::{BitPos, PosIter};
use crate::canvas::SymCtx;
use crate::code_qr;
use crate::config::CodeType;
use crate::masking;

pub const FORMAT_INFO_SIZE: u32 = 15;

fn is_format_info(_ctx: &SymCtx, x: i32, y: i32) -> bool {
    if y == 8 && (0..=8).contains(&x) {
        return true;
    }
    if x == 8 && (0..=8).contains(&y) {
        return true;
    }
    false
}

fn is_finder_pattern(_ctx: &SymCtx, x: i32, y: i32) -> bool {
    x < 8 && y < 8
}

fn is_timing_pattern(_ctx: &SymCtx, x: i32, y: i32) -> bool {
    x == 0 || y == 0
}

pub fn finder_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    code_qr::finder_pattern_iter_n(ctx, 1)
}

pub fn timing_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let period = (ctx.w - 8 + 1) as u32;
        let n = i / period % period;
        let u = (i % period) as i32;

        if n >= 2 {
            return BitPos::End;
        }
        if u > ctx.w - 8 {
            return BitPos::Trunc;
        }
        ctx.xyv(if n == 0 { 7 + u } else { 0 }, if n != 0 { 7 + u } else { 0 }, true)
    })
}

pub fn format_info_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let n = i / FORMAT_INFO_SIZE;
        let u = (i % FORMAT_INFO_SIZE) as i32;

        if n >= 1 {
            return BitPos::End;
        }

        let x = if u < 7 { u + 1 } else { 8 };
        let y = if u < 7 { 8 } else { 15 - u };

        ctx.xyv(x, y, 0x4445 & (0x4000 >> u) != 0)
    })
}

pub fn composed_data_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        let w = ctx.w;
        let h = ctx.h;
        let i = i as i32;
        let x = (w - 1) - (i % 2) - 2 * (i / (2 * h));
        let y = if i % (4 * h) < 2 * h { (h - 1) - (i / 2 % (2 * h)) } else { -h + (i / 2 % (2 * h)) };

        if x < 0 || y < 0 {
            return BitPos::End;
        }

        if is_finder_pattern(&ctx, x, y) || is_timing_pattern(&ctx, x, y) || is_format_info(&ctx, x, y) {
            return BitPos::Trunc;
        }

        let v = masking::is_mask(CodeType::MicroQr, ctx.mask, x, y);
        ctx.xyv(x, y, v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::QR_FAMILY_STRIDE;
    use crate::config::Version;
    use crate::tables;

    fn ctx(m: u8) -> SymCtx {
        let v = Version::Micro(m);
        SymCtx {
            w: v.width() as i32,
            h: v.height() as i32,
            stride: QR_FAMILY_STRIDE,
            version: v,
            mask: 0,
        }
    }

    #[test]
    fn test_walk_matches_module_budget() {
        for m in 1..=4u8 {
            let it = composed_data_iter(ctx(m));
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
            assert_eq!(count, tables::micro_available_bits(m), "M{}", m);
        }
    }

    #[test]
    fn test_single_format_copy() {
        let it = format_info_iter(ctx(2));
        let mut n = 0;
        while it(n) != BitPos::End {
            n += 1;
        }
        assert_eq!(n, 15);
    }
}
