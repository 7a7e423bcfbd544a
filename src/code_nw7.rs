/// NW-7 / Codabar: seven-element symbols of width 11 or 13, framed by the
/// start / stop letters A through D.

use crate::error::QrError;
use crate::symbol::Symbol;

static SYMBOL: [(u32, u32); 20] = [
    (/*  0 */ 0b10101000111, 11), // 0
    (/*  1 */ 0b10101110001, 11), // 1
    (/*  2 */ 0b10100010111, 11), // 2
    (/*  3 */ 0b11100010101, 11), // 3
    (/*  4 */ 0b10111010001, 11), // 4
    (/*  5 */ 0b11101010001, 11), // 5
    (/*  6 */ 0b10001010111, 11), // 6
    (/*  7 */ 0b10001011101, 11), // 7
    (/*  8 */ 0b10001110101, 11), // 8
    (/*  9 */ 0b11101000101, 11), // 9
    (/* 10 */ 0b10100011101, 11), // -
    (/* 11 */ 0b10111000101, 11), // $
    (/* 12 */ 0b1110111011101, 13), // .
    (/* 13 */ 0b1110111010111, 13), // /
    (/* 14 */ 0b1110101110111, 13), // :
    (/* 15 */ 0b1011101110111, 13), // +
    (/* 16 */ 0b1011100010001, 13), // A
    (/* 17 */ 0b1000100010111, 13), // B
    (/* 18 */ 0b1010001000111, 13), // C
    (/* 19 */ 0b1010001110001, 13), // D
];

static SYMBOL_LOOKUP: &[u8] = b"0123456789-$./:+";

fn start_stop_index(c: u8) -> Option<usize> {
    match c {
        b'A'..=b'D' => Some((c - b'A') as usize + 16),
        _ => None,
    }
}

pub fn write_data(sym: &mut Symbol, src: &[u8]) -> Result<usize, QrError> {
    if src.is_empty() {
        return Err(QrError::InvalidParameter("empty"));
    }

    let mut body = src;
    let start_code = match start_stop_index(src[0]) {
        Some(i) => {
            body = &body[1..];
            i
        }
        None => 16, // default to 'A'
    };
    let stop_code = match body.last().and_then(|&c| start_stop_index(c)) {
        Some(i) => {
            body = &body[..body.len() - 1];
            i
        }
        None => 16,
    };

    let mut indices = Vec::with_capacity(body.len());
    let mut bitlen = 0;
    for &c in body {
        let n = SYMBOL_LOOKUP
            .iter()
            .position(|&l| l == c)
            .ok_or(QrError::InvalidParameter("character"))?;
        indices.push(n);
        bitlen += SYMBOL[n].1 + 1;
    }

    let symbol_width = (SYMBOL[start_code].1 + 1 + bitlen + SYMBOL[stop_code].1) as u16;
    sym.set_symbol_width(symbol_width);

    let mut bs = sym.linear_stream();

    bs.write_bits(SYMBOL[start_code].0, SYMBOL[start_code].1); // start symbol
    bs.write_bits(0, 1);

    for &n in &indices {
        bs.write_bits(SYMBOL[n].0, SYMBOL[n].1);
        bs.write_bits(0, 1);
    }

    bs.write_bits(SYMBOL[stop_code].0, SYMBOL[stop_code].1); // stop symbol

    Ok(src.len())
}

pub fn read_data(sym: &mut Symbol) -> Result<Vec<u8>, QrError> {
    let mut bs = sym.linear_stream();

    let start = bs.read_bits(13);
    let start_idx = (16..20)
        .find(|&i| SYMBOL[i].0 == start)
        .ok_or(QrError::DecodeMismatch)?;

    let mut out = vec![b'A' + (start_idx - 16) as u8];

    loop {
        if bs.read_bits(1) != 0 {
            return Err(QrError::DecodeMismatch); // inter-symbol gap must be a space
        }

        let pos = bs.tell();
        let v11 = bs.read_bits(11);
        if let Some(i) = (0..12).find(|&i| SYMBOL[i].1 == 11 && SYMBOL[i].0 == v11) {
            out.push(SYMBOL_LOOKUP[i]);
            continue;
        }

        bs.seek(pos);
        let v13 = bs.read_bits(13);
        match (12..20).find(|&i| SYMBOL[i].0 == v13) {
            Some(i) if i >= 16 => {
                out.push(b'A' + (i - 16) as u8); // stop letter
                break;
            }
            Some(i) => out.push(SYMBOL_LOOKUP[i]),
            None => return Err(QrError::DecodeMismatch),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeType;

    #[test]
    fn test_roundtrip_with_letters() {
        let mut sym = Symbol::new(CodeType::Nw7);
        write_data(&mut sym, b"A40156B").unwrap();
        assert_eq!(read_data(&mut sym).unwrap(), b"A40156B");
    }

    #[test]
    fn test_default_start_stop() {
        let mut sym = Symbol::new(CodeType::Nw7);
        write_data(&mut sym, b"123-45/6").unwrap();
        assert_eq!(read_data(&mut sym).unwrap(), b"A123-45/6A");
    }
}
