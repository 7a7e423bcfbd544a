/// Code 93: nine-element symbols with two modulo-47 check characters
/// before the stop symbol and a single termination bar.

use crate::error::QrError;
use crate::symbol::Symbol;

static SYMBOL: [u16; 56] = [
    /*  0 */ 0b100010100, // 0
    /*  1 */ 0b101001000, // 1
    /*  2 */ 0b101000100, // 2
    /*  3 */ 0b101000010, // 3
    /*  4 */ 0b100101000, // 4
    /*  5 */ 0b100100100, // 5
    /*  6 */ 0b100100010, // 6
    /*  7 */ 0b101010000, // 7
    /*  8 */ 0b100010010, // 8
    /*  9 */ 0b100001010, // 9
    /* 10 */ 0b110101000, // A
    /* 11 */ 0b110100100, // B
    /* 12 */ 0b110100010, // C
    /* 13 */ 0b110010100, // D
    /* 14 */ 0b110010010, // E
    /* 15 */ 0b110001010, // F
    /* 16 */ 0b101101000, // G
    /* 17 */ 0b101100100, // H
    /* 18 */ 0b101100010, // I
    /* 19 */ 0b100110100, // J
    /* 20 */ 0b100011010, // K
    /* 21 */ 0b101011000, // L
    /* 22 */ 0b101001100, // M
    /* 23 */ 0b101000110, // N
    /* 24 */ 0b100101100, // O
    /* 25 */ 0b100010110, // P
    /* 26 */ 0b110110100, // Q
    /* 27 */ 0b110110010, // R
    /* 28 */ 0b110101100, // S
    /* 29 */ 0b110100110, // T
    /* 30 */ 0b110010110, // U
    /* 31 */ 0b110011010, // V
    /* 32 */ 0b101101100, // W
    /* 33 */ 0b101100110, // X
    /* 34 */ 0b100110110, // Y
    /* 35 */ 0b100111010, // Z
    /* 36 */ 0b100101110, // -
    /* 37 */ 0b111010100, // .
    /* 38 */ 0b111010010, // [SPACE]
    /* 39 */ 0b111001010, // $
    /* 40 */ 0b101101110, // /
    /* 41 */ 0b101110110, // +
    /* 42 */ 0b110101110, // %
    /* 43 */ 0b100100110, // ($)
    /* 44 */ 0b111011010, // (%)
    /* 45 */ 0b111010110, // (/)
    /* 46 */ 0b100110010, // (+)
    /* 47 */ 0b101011110, // [START] / [STOP]
    /* 48 */ 0b101111010, // (reverse stop)
    /* 49 */ 0b111101010, // (unused)
    /* 50 */ 0b101011100, // (unused)
    /* 51 */ 0b101001110, // (unused)
    /* 52 */ 0b101110100, // (unused)
    /* 53 */ 0b101110010, // (unused)
    /* 54 */ 0b110111010, // (unused)
    /* 55 */ 0b110110110, // (unused)
];

static SYMBOL_LOOKUP: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

fn check_chars(values: &[usize]) -> (usize, usize) {
    let mut w = values.len() as i64 - 1;
    let mut c = 0usize;
    let mut k = 0usize;
    for &n in values {
        c = (c + n * ((w as usize) % 20 + 1)) % 47;
        k = (k + n * ((w as usize + 1) % 15 + 1)) % 47;
        w -= 1;
    }
    (c, (k + c) % 47)
}

pub fn write_data(sym: &mut Symbol, src: &[u8]) -> Result<usize, QrError> {
    let symbol_width = 9 + 9 * src.len() as u16 + 9 + 9 + 9 + 1;
    sym.set_symbol_width(symbol_width);

    let mut values = Vec::with_capacity(src.len());
    for &c in src {
        let n = SYMBOL_LOOKUP
            .iter()
            .position(|&l| l == c)
            .ok_or(QrError::InvalidParameter("character"))?;
        values.push(n);
    }
    let (c, k) = check_chars(&values);

    let mut bs = sym.linear_stream();

    bs.write_bits(SYMBOL[47] as u32, 9); // Start Symbol
    for &n in &values {
        bs.write_bits(SYMBOL[n] as u32, 9);
    }
    bs.write_bits(SYMBOL[c] as u32, 9); // 1st check character
    bs.write_bits(SYMBOL[k] as u32, 9); // 2nd check character
    bs.write_bits(SYMBOL[47] as u32, 9); // Stop Symbol
    bs.write_bits(1, 1); // Termination bar

    Ok(src.len())
}

pub fn read_data(sym: &mut Symbol) -> Result<Vec<u8>, QrError> {
    let mut bs = sym.linear_stream();

    if bs.read_bits(9) != SYMBOL[47] as u32 {
        return Err(QrError::DecodeMismatch);
    }

    let mut values = Vec::new();
    loop {
        let v = bs.read_bits(9);
        if v == SYMBOL[47] as u32 {
            break;
        }
        let idx = SYMBOL[..47]
            .iter()
            .position(|&s| s as u32 == v)
            .ok_or(QrError::DecodeMismatch)?;
        values.push(idx);
    }
    if bs.read_bits(1) != 1 {
        return Err(QrError::DecodeMismatch);
    }

    if values.len() < 2 {
        return Err(QrError::DecodeMismatch);
    }
    let data = &values[..values.len() - 2];
    let (c, k) = check_chars(data);
    if values[values.len() - 2] != c || values[values.len() - 1] != k {
        return Err(QrError::DecodeMismatch);
    }

    // the shift codes are not expanded here
    data.iter()
        .map(|&n| SYMBOL_LOOKUP.get(n).copied().ok_or(QrError::DecodeMismatch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeType;

    #[test]
    fn test_roundtrip() {
        let mut sym = Symbol::new(CodeType::Code93);
        assert_eq!(write_data(&mut sym, b"WIKIPEDIA").unwrap(), 9);
        assert_eq!(read_data(&mut sym).unwrap(), b"WIKIPEDIA");
    }

    #[test]
    fn test_check_characters_guard_the_payload() {
        let mut sym = Symbol::new(CodeType::Code93);
        write_data(&mut sym, b"CODE93").unwrap();
        // clobber one data symbol on the canvas
        let v = sym.read_pixel(9 + 2, 0);
        sym.write_pixel(9 + 2, 0, !v);
        assert!(read_data(&mut sym).is_err());
    }
}
