/// The fixed 19x19 tQR variant: three QR-style finders and timing lines,
/// no format or version info, and a hard-coded coordinate table in place
/// of the zig-zag walk.

use crate::bitstream::{BitPos, PosIter};
use crate::canvas::SymCtx;
use crate::code_qr;
use crate::config::CodeType;
use crate::masking;

pub const DATA_BITS: u32 = 160;

#[rustfmt::skip]
static DATA_XYPOS: [(u8, u8); DATA_BITS as usize] = [
    (16, 18), (17, 17), (16, 17), (18, 16), (17, 16), (16, 16), (18, 15), (17, 15),
    (16, 15), (18, 14), (17, 14), (16, 14), (18, 13), (17, 13), (16, 13), (18, 12),
    (17, 12), (16, 12), (18, 11), (17, 11), (16, 11), (18, 10), (17, 10), (16, 10),
    (18,  9), (17,  9), (16,  9), (18,  8), (17,  8), (16,  8), (15,  9), (14,  9),
    (13,  9), (12,  9), (11,  9), (15,  8), (14,  8), (13,  8), (12,  8), (11,  8),
    (15, 11), (14, 11), (13, 11), (12, 11), (11, 11), (15, 10), (14, 10), (13, 10),
    (12, 10), (11, 10), (14, 15), (13, 15), (15, 14), (14, 14), (13, 14), (15, 13),
    (14, 13), (13, 13), (15, 12), (14, 12), (11, 15), (10, 15), (12, 14), (11, 14),
    (10, 14), (12, 13), (11, 13), (13, 12), (12, 12), (11, 12), (15, 18), (14, 18),
    (13, 18), (15, 17), (14, 17), (13, 17), (15, 16), (14, 16), (13, 16), (15, 15),
    (12, 18), (11, 18), (10, 18), (12, 17), (11, 17), (10, 17), (12, 16), (11, 16),
    (10, 16), (12, 15), ( 9, 18), ( 8, 18), ( 9, 17), ( 8, 17), ( 9, 16), ( 8, 16),
    ( 9, 15), ( 8, 15), ( 9, 14), ( 8, 14), (10, 13), ( 9, 13), ( 8, 13), (10, 12),
    ( 9, 12), ( 8, 12), (10, 11), ( 9, 11), ( 8, 11), (10, 10), ( 9, 10), ( 8, 10),
    (10,  9), ( 9,  9), ( 8,  9), (10,  8), ( 9,  8), ( 8,  8), ( 7,  8), (10,  7),
    ( 9,  7), ( 8,  7), (10,  5), ( 9,  5), ( 8,  5), (10,  4), ( 9,  4), ( 8,  4),
    (10,  3), ( 9,  3), ( 8,  3), (10,  2), ( 9,  2), ( 8,  2), (10,  1), ( 9,  1),
    ( 8,  1), (10,  0), ( 9,  0), ( 8,  0), ( 7, 10), ( 5, 10), ( 4, 10), ( 7,  9),
    ( 5,  9), ( 4,  9), ( 3,  9), ( 5,  8), ( 4,  8), ( 3,  8), ( 3, 10), ( 2, 10),
    ( 1, 10), ( 0, 10), ( 2,  9), ( 1,  9), ( 0,  9), ( 2,  8), ( 1,  8), ( 0,  8),
];

pub fn finder_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    code_qr::finder_pattern_iter_n(ctx, 3)
}

pub fn timing_pattern_iter(ctx: SymCtx) -> PosIter<'static> {
    code_qr::timing_pattern_iter(ctx)
}

pub fn composed_data_iter(ctx: SymCtx) -> PosIter<'static> {
    Box::new(move |i| {
        if i >= DATA_BITS {
            return BitPos::End;
        }
        let (x, y) = DATA_XYPOS[i as usize];
        let (x, y) = (x as i32, y as i32);

        let v = masking::is_mask(CodeType::Tqr, ctx.mask, x, y);
        ctx.xyv(x, y, v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::QR_FAMILY_STRIDE;
    use crate::config::Version;
    use std::collections::HashSet;

    #[test]
    fn test_table_positions_unique_and_in_range() {
        let mut seen = HashSet::new();
        for &(x, y) in DATA_XYPOS.iter() {
            assert!(x < 19 && y < 19);
            assert!(seen.insert((x, y)), "({}, {}) listed twice", x, y);
            // nothing may land on the finders or timing lines
            assert!(!(x < 8 && y < 8));
            assert!(!(x < 8 && y >= 11));
            assert!(!(x >= 11 && y < 8));
            assert!(x != 6 && y != 6);
        }
    }

    #[test]
    fn test_iter_ends_after_table() {
        let ctx = SymCtx {
            w: 19,
            h: 19,
            stride: QR_FAMILY_STRIDE,
            version: Version::Tqr,
            mask: 0,
        };
        let it = composed_data_iter(ctx);
        assert!(it(DATA_BITS - 1) != BitPos::End);
        assert_eq!(it(DATA_BITS), BitPos::End);
    }
}
