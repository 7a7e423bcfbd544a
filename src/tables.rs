/// Contains lookup tables and other computation functions that provide
/// reference data needed for encoding or decoding a symbol, such as the
/// Reed-Solomon block structure of each code configuration, alignment
/// pattern centres and the BCH codeword lists for format and version info.

use lazy_static::lazy_static;

use std::collections::HashMap;

use crate::config::{EccLevel, SymbolConfig, Version};

// ECC codewords per block, indexed by [version - 1][level]
pub static QR_ERROR_WORDS_IN_BLOCK: [[u8; 4]; 40] = [
    //  L,  M,  Q,  H
    [7, 10, 13, 17],  //  1
    [10, 16, 22, 28], //  2
    [15, 26, 18, 22], //  3
    [20, 18, 26, 16], //  4
    [26, 24, 18, 22], //  5
    [18, 16, 24, 28], //  6
    [20, 18, 18, 26], //  7
    [24, 22, 22, 26], //  8
    [30, 22, 20, 24], //  9
    [18, 26, 24, 28], // 10
    [20, 30, 28, 24], // 11
    [24, 22, 26, 28], // 12
    [26, 22, 24, 22], // 13
    [30, 24, 20, 24], // 14
    [22, 24, 30, 24], // 15
    [24, 28, 24, 30], // 16
    [28, 28, 28, 28], // 17
    [30, 26, 28, 28], // 18
    [28, 26, 26, 26], // 19
    [28, 26, 30, 28], // 20
    [28, 26, 28, 30], // 21
    [28, 28, 30, 24], // 22
    [30, 28, 30, 30], // 23
    [30, 28, 30, 30], // 24
    [26, 28, 30, 30], // 25
    [28, 28, 28, 30], // 26
    [30, 28, 30, 30], // 27
    [30, 28, 30, 30], // 28
    [30, 28, 30, 30], // 29
    [30, 28, 30, 30], // 30
    [30, 28, 30, 30], // 31
    [30, 28, 30, 30], // 32
    [30, 28, 30, 30], // 33
    [30, 28, 30, 30], // 34
    [30, 28, 30, 30], // 35
    [30, 28, 30, 30], // 36
    [30, 28, 30, 30], // 37
    [30, 28, 30, 30], // 38
    [30, 28, 30, 30], // 39
    [30, 28, 30, 30], // 40
];

// RS block counts, indexed by [version - 1][level]
pub static QR_TOTAL_RS_BLOCKS: [[u8; 4]; 40] = [
    //  L,  M,  Q,  H
    [1, 1, 1, 1],     //  1
    [1, 1, 1, 1],     //  2
    [1, 1, 2, 2],     //  3
    [1, 2, 2, 4],     //  4
    [1, 2, 4, 4],     //  5
    [2, 4, 4, 4],     //  6
    [2, 4, 6, 5],     //  7
    [2, 4, 6, 6],     //  8
    [2, 5, 8, 8],     //  9
    [4, 5, 8, 8],     // 10
    [4, 5, 8, 11],    // 11
    [4, 8, 10, 11],   // 12
    [4, 9, 12, 16],   // 13
    [4, 9, 16, 16],   // 14
    [6, 10, 12, 18],  // 15
    [6, 10, 17, 16],  // 16
    [6, 11, 16, 19],  // 17
    [6, 13, 18, 21],  // 18
    [7, 14, 21, 25],  // 19
    [8, 16, 20, 25],  // 20
    [8, 17, 23, 25],  // 21
    [9, 17, 23, 34],  // 22
    [9, 18, 25, 30],  // 23
    [10, 20, 27, 32], // 24
    [12, 21, 29, 35], // 25
    [12, 23, 34, 37], // 26
    [12, 25, 34, 40], // 27
    [13, 26, 35, 42], // 28
    [14, 28, 38, 45], // 29
    [15, 29, 40, 48], // 30
    [16, 31, 43, 51], // 31
    [17, 33, 45, 54], // 32
    [18, 35, 48, 57], // 33
    [19, 37, 51, 60], // 34
    [19, 38, 53, 63], // 35
    [20, 40, 56, 66], // 36
    [21, 43, 59, 70], // 37
    [22, 45, 62, 74], // 38
    [24, 47, 65, 77], // 39
    [25, 49, 68, 81], // 40
];

pub fn qr_error_words_in_block(version: u8, level: EccLevel) -> u32 {
    QR_ERROR_WORDS_IN_BLOCK[(version - 1) as usize][level.index()] as u32
}

pub fn qr_total_blocks(version: u8, level: EccLevel) -> u32 {
    QR_TOTAL_RS_BLOCKS[(version - 1) as usize][level.index()] as u32
}

// The 32 legal BCH(15,5) codewords; the index is the 5-bit data value.
pub static BCH_15_5: [u16; 32] = [
    0x0000, 0x0537, 0x0A6E, 0x0F59, 0x11EB, 0x14DC, 0x1B85, 0x1EB2, 0x23D6, 0x26E1, 0x29B8, 0x2C8F,
    0x323D, 0x370A, 0x3853, 0x3D64, 0x429B, 0x47AC, 0x48F5, 0x4DC2, 0x5370, 0x5647, 0x591E, 0x5C29,
    0x614D, 0x647A, 0x6B23, 0x6E14, 0x70A6, 0x7591, 0x7AC8, 0x7FFF,
];

// The 64 legal BCH(18,6) codewords; the index is the 6-bit data value.
// Entry v is also the version info codeword of QR version v.
pub static BCH_18_6: [u32; 64] = [
    0x00000, 0x01f25, 0x0216f, 0x03e4a, 0x042de, 0x05dfb, 0x063b1, 0x07c94, 0x085bc, 0x09a99,
    0x0a4d3, 0x0bbf6, 0x0c762, 0x0d847, 0x0e60d, 0x0f928, 0x10b78, 0x1145d, 0x12a17, 0x13532,
    0x149a6, 0x15683, 0x168c9, 0x177ec, 0x18ec4, 0x191e1, 0x1afab, 0x1b08e, 0x1cc1a, 0x1d33f,
    0x1ed75, 0x1f250, 0x209d5, 0x216f0, 0x228ba, 0x2379f, 0x24b0b, 0x2542e, 0x26a64, 0x27541,
    0x28c69, 0x2934c, 0x2ad06, 0x2b223, 0x2ceb7, 0x2d192, 0x2efd8, 0x2f0fd, 0x302ad, 0x31d88,
    0x323c2, 0x33ce7, 0x34073, 0x35f56, 0x3611c, 0x37e39, 0x38711, 0x39834, 0x3a67e, 0x3b95b,
    0x3c5cf, 0x3daea, 0x3e4a0, 0x3fb85,
];

/// number of alignment patterns on a QR symbol (three corners skipped)
pub fn qr_alignment_num(version: u8) -> u32 {
    if version <= 1 {
        return 0;
    }
    let n = (version / 7 + 2) as u32;
    n * n - 3
}

fn qr_alignment_steps(version: u8, step: u32) -> u32 {
    if version <= 1 {
        return 0;
    }
    let v = version as u32;
    let n = v / 7 + 2;
    if step >= n {
        return 0;
    }
    let r = ((((v + 1) * 8 / (n - 1)) + 3) / 4) * 2 * (n - step - 1);
    let v4 = v * 4;

    if v4 < r {
        6
    } else {
        v4 - r + 10
    }
}

/// centre of the idx-th alignment pattern; (0, _) or (_, 0) marks one of
/// the skipped finder corners
pub fn qr_alignment_position(version: u8, idx: u32) -> (u32, u32) {
    let n = (version / 7 + 2) as u32;
    let (xi, yi) = if idx + 1 < n - 1 {
        ((idx + 1) % n, (idx + 1) / n)
    } else if idx + 2 < (n - 1) * n {
        ((idx + 2) % n, (idx + 2) / n)
    } else {
        ((idx + 3) % n, (idx + 3) / n)
    };
    (qr_alignment_steps(version, xi), qr_alignment_steps(version, yi))
}

/// modules left for data and ECC once every function pattern is placed
pub fn qr_available_bits(version: u8) -> u32 {
    let symbol_size = 17 + 4 * version as u32;

    let finder_pattern = 8 * 8 * 3;
    let n = if version > 1 { (version / 7 + 2) as u32 } else { 0 };
    let alignment_pattern = if version > 1 { 5 * 5 * (n * n - 3) } else { 0 };
    let timing_pattern = (symbol_size - 8 * 2 - if version > 1 { 5 * (n - 2) } else { 0 }) * 2;
    let version_info = if version >= 7 { 6 * 3 * 2 } else { 0 };
    let format_info = 15 * 2 + 1;

    let function_bits = finder_pattern + alignment_pattern + timing_pattern + version_info + format_info;

    symbol_size * symbol_size - function_bits
}

/// micro QR module budget per M index (1..=4)
pub fn micro_available_bits(m: u8) -> u32 {
    [36, 80, 132, 192][(m - 1) as usize]
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct MicroCapacity {
    pub total_words: u32,
    pub data_words: u32,
}

macro_rules! define_micro_capacity_table {
    {$(
        $m:expr, $ecc:expr, $total:expr, $data:expr;
    )*} => {
        lazy_static! {
            pub static ref MICRO_CAPACITY_TABLE: HashMap<SymbolConfig, MicroCapacity> = [
                $(
                    (SymbolConfig::new(Version::Micro($m), $ecc), MicroCapacity { total_words: $total, data_words: $data }),
                )*
            ].iter().copied().collect();
        }
    }
}

define_micro_capacity_table!(
    1, EccLevel::L, 5, 3;

    2, EccLevel::L, 10, 5;
    2, EccLevel::M, 10, 4;

    3, EccLevel::L, 17, 11;
    3, EccLevel::M, 17, 9;

    4, EccLevel::L, 24, 16;
    4, EccLevel::M, 24, 14;
    4, EccLevel::Q, 24, 10;
);

// Heights 7..17 crossed with widths wide enough for 2h+9 modules.
pub static RMQR_DIMS: [(u8, u8); 30] = [
    (7, 43), (7, 59), (7, 77), (7, 99), (7, 139),
    (9, 43), (9, 59), (9, 77), (9, 99), (9, 139),
    (11, 43), (11, 59), (11, 77), (11, 99), (11, 139),
    (13, 43), (13, 59), (13, 77), (13, 99), (13, 139),
    (15, 43), (15, 59), (15, 77), (15, 99), (15, 139),
    (17, 43), (17, 59), (17, 77), (17, 99), (17, 139),
];

/// alignment / vertical-timing column centres per symbol width
pub fn rmqr_alignment_columns(width: u8) -> &'static [u8] {
    match width {
        43 => &[21],
        59 => &[19, 39],
        77 => &[25, 51],
        99 => &[23, 49, 75],
        139 => &[27, 55, 83, 111],
        _ => &[],
    }
}

/// ECC allocation for an rMQR symbol: (block count, ECC words per block).
/// Level M reserves roughly two fifths of the codewords, level H roughly
/// two thirds, blocked so a single block never carries more than 30 ECC
/// words. Levels L and Q do not exist for rMQR.
pub fn rmqr_ecc_split(total_words: u32, level: EccLevel) -> (u32, u32) {
    let mut target = match level {
        EccLevel::H => total_words * 2 / 3,
        _ => (total_words * 2 + 2) / 5,
    };
    if target >= total_words {
        target = total_words - 1;
    }
    if target < 2 {
        target = 2;
    }

    let blocks = (target + 29) / 30;
    let ew_in_block = target / blocks;
    (blocks, ew_in_block)
}

// character count field widths, indexed by [band][mode]
static QR_LENGTH_BITS: [[u32; 4]; 3] = [
    // numeric, alnum, byte, kanji
    [10, 9, 8, 8],   // versions 1..9
    [12, 11, 16, 10], // versions 10..26
    [14, 13, 16, 12], // versions 27..40
];

static MICRO_LENGTH_BITS: [[u32; 4]; 4] = [
    [3, 0, 0, 0], // M1
    [4, 3, 0, 0], // M2
    [5, 4, 4, 3], // M3
    [6, 5, 5, 4], // M4
];

fn bit_length(v: u32) -> u32 {
    32 - v.leading_zeros()
}

lazy_static! {
    // widths derived from each version's module budget so the writer and
    // the parser always agree
    static ref RMQR_LENGTH_BITS: [[u32; 4]; 30] = {
        let mut tbl = [[0u32; 4]; 30];
        for (i, row) in tbl.iter_mut().enumerate() {
            let bits = crate::code_rmqr::available_bits(i as u8);
            row[0] = bit_length(bits * 3 / 10);
            row[1] = bit_length(bits * 2 / 11);
            row[2] = bit_length(bits / 8);
            row[3] = bit_length(bits / 13);
        }
        tbl
    };
}

/// width of the character count field; mode is 0 numeric, 1 alnum,
/// 2 byte, 3 kanji
pub fn length_bits(version: Version, mode: usize) -> u32 {
    match version {
        Version::Qr(_) => QR_LENGTH_BITS[version.band()][mode],
        Version::Micro(m) => MICRO_LENGTH_BITS[(m - 1) as usize][mode],
        Version::Rect(i) => RMQR_LENGTH_BITS[i as usize][mode],
        Version::Tqr => 0, // tQR carries a fixed 12-digit numeric payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_table_against_annex() {
        assert_eq!(qr_alignment_num(1), 0);
        assert_eq!(qr_alignment_num(2), 1);
        assert_eq!(qr_alignment_num(7), 6);
        assert_eq!(qr_alignment_num(40), 46);

        // version 2 has its single pattern at (18, 18)
        assert_eq!(qr_alignment_position(2, 0), (18, 18));
        // version 7 steps are 6, 22, 38
        assert_eq!(qr_alignment_steps(7, 0), 6);
        assert_eq!(qr_alignment_steps(7, 1), 22);
        assert_eq!(qr_alignment_steps(7, 2), 38);
    }

    #[test]
    fn test_available_bits() {
        assert_eq!(qr_available_bits(1), 26 * 8);
        assert_eq!(qr_available_bits(2) / 8, 44);
        assert_eq!(qr_available_bits(3) / 8, 70);
        assert_eq!(qr_available_bits(40) / 8, 3706);
    }

    #[test]
    fn test_micro_table() {
        let c = MICRO_CAPACITY_TABLE[&SymbolConfig::new(Version::Micro(3), EccLevel::M)];
        assert_eq!(c.total_words, 17);
        assert_eq!(c.data_words, 9);
        assert!(MICRO_CAPACITY_TABLE
            .get(&SymbolConfig::new(Version::Micro(1), EccLevel::M))
            .is_none());
    }

    #[test]
    fn test_rmqr_split_invariants() {
        for total in 10..160 {
            for &level in &[EccLevel::M, EccLevel::H] {
                let (blocks, ew) = rmqr_ecc_split(total, level);
                assert!(blocks >= 1 && ew >= 1);
                assert!(blocks * ew < total, "no room for data at total={}", total);
                assert!(ew <= 30);
            }
        }
    }

    #[test]
    fn test_length_bits() {
        assert_eq!(length_bits(Version::Qr(1), 0), 10);
        assert_eq!(length_bits(Version::Qr(10), 2), 16);
        assert_eq!(length_bits(Version::Qr(40), 3), 12);
        assert_eq!(length_bits(Version::Micro(1), 0), 3);
        assert_eq!(length_bits(Version::Micro(4), 1), 5);
    }
}
