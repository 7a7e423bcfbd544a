/// Code 39: 43 symbols of nine elements (five bars, four spaces), three
/// of them wide, separated by a narrow space, framed by `*` start / stop
/// symbols.

use crate::error::QrError;
use crate::symbol::Symbol;

static SYMBOL: [u16; 44] = [
    /*  0 */ 0b111010001010111, // 1
    /*  1 */ 0b101110001010111, // 2
    /*  2 */ 0b111011100010101, // 3
    /*  3 */ 0b101000111010111, // 4
    /*  4 */ 0b111010001110101, // 5
    /*  5 */ 0b101110001110101, // 6
    /*  6 */ 0b101000101110111, // 7
    /*  7 */ 0b111010001011101, // 8
    /*  8 */ 0b101110001011101, // 9
    /*  9 */ 0b101000111011101, // 0
    /* 10 */ 0b111010100010111, // A
    /* 11 */ 0b101110100010111, // B
    /* 12 */ 0b111011101000101, // C
    /* 13 */ 0b101011100010111, // D
    /* 14 */ 0b111010111000101, // E
    /* 15 */ 0b101110111000101, // F
    /* 16 */ 0b101010001110111, // G
    /* 17 */ 0b111010100011101, // H
    /* 18 */ 0b101110100011101, // I
    /* 19 */ 0b101011100011101, // J
    /* 20 */ 0b111010101000111, // K
    /* 21 */ 0b101110101000111, // L
    /* 22 */ 0b111011101010001, // M
    /* 23 */ 0b101011101000111, // N
    /* 24 */ 0b111010111010001, // O
    /* 25 */ 0b101110111010001, // P
    /* 26 */ 0b101010111000111, // Q
    /* 27 */ 0b111010101110001, // R
    /* 28 */ 0b101110101110001, // S
    /* 29 */ 0b101011101110001, // T
    /* 30 */ 0b111000101010111, // U
    /* 31 */ 0b100011101010111, // V
    /* 32 */ 0b111000111010101, // W
    /* 33 */ 0b100010111010111, // X
    /* 34 */ 0b111000101110101, // Y
    /* 35 */ 0b100011101110101, // Z
    /* 36 */ 0b100010101110111, // -
    /* 37 */ 0b111000101011101, // .
    /* 38 */ 0b100011101011101, // (space)
    /* 39 */ 0b100010001000101, // $
    /* 40 */ 0b100010001010001, // /
    /* 41 */ 0b100010100010001, // +
    /* 42 */ 0b101000100010001, // %
    /* 43 */ 0b100010111011101, // *
];

static SYMBOL_LOOKUP: &[u8] = b"1234567890ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

pub fn write_data(sym: &mut Symbol, src: &[u8]) -> Result<usize, QrError> {
    let symbol_width = 15 + 1 + src.len() as u16 * 16 + 15;
    sym.set_symbol_width(symbol_width);

    let mut bs = sym.linear_stream();

    bs.write_bits(SYMBOL[43] as u32, 15); // Start Symbol
    bs.write_bits(0, 1);

    for &c in src {
        let q = SYMBOL_LOOKUP
            .iter()
            .position(|&l| l == c)
            .ok_or(QrError::InvalidParameter("character"))?;

        bs.write_bits(SYMBOL[q] as u32, 15);
        bs.write_bits(0, 1);
    }

    bs.write_bits(SYMBOL[43] as u32, 15); // Stop Symbol

    Ok(src.len())
}

pub fn read_data(sym: &mut Symbol) -> Result<Vec<u8>, QrError> {
    let mut bs = sym.linear_stream();

    if bs.read_bits(15) != SYMBOL[43] as u32 {
        return Err(QrError::DecodeMismatch);
    }

    let mut out = Vec::new();
    loop {
        bs.read_bits(1); // inter-symbol gap
        let v = bs.read_bits(15);
        if v == SYMBOL[43] as u32 {
            break;
        }
        let idx = SYMBOL[..43]
            .iter()
            .position(|&s| s as u32 == v)
            .ok_or(QrError::DecodeMismatch)?;
        out.push(SYMBOL_LOOKUP[idx]);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeType;

    #[test]
    fn test_roundtrip() {
        let mut sym = Symbol::new(CodeType::Code39);
        assert_eq!(write_data(&mut sym, b"CODE-39 $1.0").unwrap(), 12);
        assert_eq!(sym.canvas.symbol_width, 15 + 1 + 12 * 16 + 15);
        assert_eq!(read_data(&mut sym).unwrap(), b"CODE-39 $1.0");
    }

    #[test]
    fn test_rejects_lowercase() {
        let mut sym = Symbol::new(CodeType::Code39);
        assert!(write_data(&mut sym, b"abc").is_err());
    }

    #[test]
    fn test_empty_canvas_does_not_decode() {
        let mut sym = Symbol::new(CodeType::Code39);
        assert!(read_data(&mut sym).is_err());
    }
}
