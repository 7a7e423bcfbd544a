/// Segment-level payload codec: mode selection, numeric / alphanumeric /
/// byte / kanji / ECI segment writing and the matching parser. Operates on
/// logical data words; the payload module shuffles those through the block
/// interleave.

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use log::debug;

use crate::config::{EciCode, Version};
use crate::kanji;
use crate::tables;

/// character set of alphanumeric mode; the index is the coded value
pub static ALNUM: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";
// the subset that decides byte-vs-alnum crossover (digits excluded)
static ALNUM_CMP: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Numeric,
    Alnum,
    Byte,
    Kanji,
}

const QR_MODE_NUMERIC: u32 = 0b0001;
const QR_MODE_ALNUM: u32 = 0b0010;
const QR_MODE_BYTE: u32 = 0b0100;
const QR_MODE_KANJI: u32 = 0b1000;
const QR_MODE_ECI: u32 = 0b0111;
const QR_MODE_STRUCTURED: u32 = 0b0011;

const RMQR_MODE_END: u32 = 0;

fn is_numeric(ch: u8) -> bool {
    (b'0'..=b'9').contains(&ch)
}

fn measure_numeric(src: &[u8]) -> usize {
    src.iter().take_while(|&&c| is_numeric(c)).count()
}

fn measure_alnum(src: &[u8]) -> usize {
    src.iter().take_while(|&&c| ALNUM.contains(&c)).count()
}

/// leading run of characters that force byte mode
fn len_cmp_8bit(src: &[u8]) -> usize {
    src.iter().take_while(|&&c| !ALNUM.contains(&c)).count()
}

/// leading run of non-digit alphanumeric characters
fn len_cmp_alnum(src: &[u8]) -> usize {
    src.iter().take_while(|&&c| ALNUM_CMP.contains(&c)).count()
}

/// (characters, bytes) of the leading kanji-mappable run under `eci`
fn measure_kanji(src: &[u8], eci: EciCode) -> (usize, usize) {
    let mut chars = 0;
    let mut bytes = 0;
    while bytes < src.len() {
        match kanji::index_from_bytes(&src[bytes..], eci) {
            Some((idx, consumed)) if idx < 0x1FFF => {
                chars += 1;
                bytes += consumed;
            }
            _ => break,
        }
    }
    (chars, bytes)
}

/// Writes segments into a plain byte vector sized for one (version, level)
/// payload. `finalize` appends the terminator and pad words and yields the
/// data words ready for interleaving.
pub struct SegmentWriter {
    version: Version,
    eci: EciCode,
    eci_last: EciCode,
    cap_bits: u32,
    bits: u32,
    overflow: bool,
    w: BitWriter<Vec<u8>, BigEndian>,
}

impl SegmentWriter {
    pub fn new(version: Version, cap_bits: u32, eci: EciCode) -> SegmentWriter {
        SegmentWriter {
            version,
            eci,
            eci_last: EciCode::Latin1,
            cap_bits,
            bits: 0,
            overflow: false,
            w: BitWriter::endian(Vec::new(), BigEndian),
        }
    }

    pub fn bits_written(&self) -> u32 {
        self.bits
    }

    fn put(&mut self, value: u32, num_bits: u32) -> bool {
        if num_bits == 0 {
            return true;
        }
        if self.overflow || self.bits + num_bits > self.cap_bits {
            self.overflow = true;
            return false;
        }
        self.w.write(num_bits, value).unwrap();
        self.bits += num_bits;
        true
    }

    fn put_mode(&mut self, mode: Mode) -> bool {
        match self.version {
            Version::Qr(_) => {
                let v = match mode {
                    Mode::Numeric => QR_MODE_NUMERIC,
                    Mode::Alnum => QR_MODE_ALNUM,
                    Mode::Byte => QR_MODE_BYTE,
                    Mode::Kanji => QR_MODE_KANJI,
                };
                self.put(v, 4)
            }
            Version::Micro(m) => {
                let v = match mode {
                    Mode::Numeric => 0,
                    Mode::Alnum => 1,
                    Mode::Byte => 2,
                    Mode::Kanji => 3,
                };
                self.put(v, m as u32 - 1)
            }
            Version::Rect(_) => {
                let v = match mode {
                    Mode::Numeric => 1,
                    Mode::Alnum => 2,
                    Mode::Byte => 3,
                    Mode::Kanji => 4,
                };
                self.put(v, 3)
            }
            // tQR carries bare numeric data
            Version::Tqr => mode == Mode::Numeric,
        }
    }

    fn put_eci(&mut self, eci: EciCode) -> bool {
        if !self.version.is_qr() {
            // micro QR cannot carry ECI, rMQR is left out as well
            return false;
        }
        if !self.put(QR_MODE_ECI, 4) {
            return false;
        }
        let v = eci.value();
        if v <= 127 {
            self.put(v, 8)
        } else if v <= 16383 {
            self.put(0b10, 2) && self.put(v, 14)
        } else if v <= 999_999 {
            self.put(0b110, 3) && self.put(v, 21)
        } else {
            false
        }
    }

    pub fn write_numeric(&mut self, src: &[u8], len: usize) -> usize {
        if measure_numeric(src) < len {
            return 0;
        }
        if !self.put_mode(Mode::Numeric) {
            return 0;
        }
        self.put(len as u32, tables::length_bits(self.version, 0));

        let mut i = 0;
        while i < len {
            let remain = (len - i).min(3);
            let mut n: u32 = 0;
            for _ in 0..remain {
                n = n * 10 + (src[i] - b'0') as u32;
                i += 1;
            }
            let width = match remain {
                3 => 10,
                2 => 7,
                _ => 4,
            };
            if !self.put(n, width) {
                return i - remain;
            }
        }
        i
    }

    pub fn write_alnum(&mut self, src: &[u8], len: usize) -> usize {
        if measure_alnum(src) < len {
            return 0;
        }
        if self.version == Version::Micro(1) {
            return 0;
        }
        if !self.put_mode(Mode::Alnum) {
            return 0;
        }
        self.put(len as u32, tables::length_bits(self.version, 1));

        let mut i = 0;
        while i < len {
            let remain = (len - i).min(2);
            let mut n: u32 = 0;
            for _ in 0..remain {
                let v = ALNUM.iter().position(|&c| c == src[i]).unwrap() as u32;
                n = n * 45 + v;
                i += 1;
            }
            if !self.put(n, if remain == 2 { 11 } else { 6 }) {
                return i - remain;
            }
        }
        i
    }

    pub fn write_bytes(&mut self, src: &[u8], len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        if self.eci_last != self.eci {
            self.put_eci(self.eci);
            self.eci_last = self.eci;
        }
        if matches!(self.version, Version::Micro(m) if m <= 2) {
            return 0;
        }
        if !self.put_mode(Mode::Byte) {
            return 0;
        }
        self.put(len as u32, tables::length_bits(self.version, 2));

        for i in 0..len {
            if !self.put(src[i] as u32, 8) {
                return i;
            }
        }
        len
    }

    pub fn write_kanji(&mut self, src: &[u8], len: usize) -> usize {
        let (kanji_len, byte_len) = measure_kanji(&src[..len.min(src.len())], self.eci);
        if byte_len < len {
            return 0;
        }
        if matches!(self.version, Version::Micro(m) if m <= 2) {
            return 0;
        }
        if !self.put_mode(Mode::Kanji) {
            return 0;
        }
        self.put(kanji_len as u32, tables::length_bits(self.version, 3));

        let mut i = 0;
        while i < len {
            let (idx, consumed) = match kanji::index_from_bytes(&src[i..], self.eci) {
                Some((idx, consumed)) if idx < 0x1FFF => (idx, consumed),
                _ => break,
            };
            if !self.put(idx as u32, 13) {
                return i;
            }
            i += consumed;
        }
        i
    }

    fn flush(&mut self, mode: Mode, src: &[u8], len: usize) -> usize {
        match mode {
            Mode::Numeric => self.write_numeric(src, len),
            Mode::Alnum => self.write_alnum(src, len),
            Mode::Byte => self.write_bytes(src, len),
            Mode::Kanji => self.write_kanji(src, len),
        }
    }

    /// Greedy mode switching over the input. Returns the number of input
    /// bytes consumed; anything short of `src.len()` means the symbol was
    /// too small. The crossover thresholds depend on the version band.
    pub fn write_auto(&mut self, src: &[u8]) -> usize {
        let len = src.len();
        let band = self.version.band();
        let verdep = |a: usize, b: usize, c: usize| [a, b, c][band];

        // initial mode
        let mut mode;
        if measure_kanji(src, self.eci).0 > 0 {
            mode = Mode::Kanji;
        } else if len_cmp_8bit(src) > 0 {
            mode = Mode::Byte;
        } else {
            let l = len_cmp_alnum(src);
            if l > 0 {
                mode = if l < verdep(6, 7, 8) && l < len { Mode::Byte } else { Mode::Alnum };
            } else {
                let l = measure_numeric(src);
                if l < verdep(4, 4, 5) && len_cmp_8bit(&src[l..]) > 0 {
                    mode = Mode::Byte;
                } else if l < verdep(7, 8, 9) && len_cmp_alnum(&src[l..]) > 0 {
                    mode = Mode::Alnum;
                } else {
                    mode = Mode::Numeric;
                }
            }
        }

        let mut last_i = 0;
        let mut last_mode = mode;

        let mut i = 0;
        while i < len {
            let mut byte_len = 1;
            let (kanji_chars, kanji_bytes) = measure_kanji(&src[i..], self.eci);
            if kanji_chars > 0 {
                mode = Mode::Kanji;
                byte_len = kanji_bytes;
            } else {
                match mode {
                    Mode::Kanji | Mode::Byte => {
                        mode = Mode::Byte;
                        if measure_numeric(&src[i..]) >= verdep(6, 8, 9) {
                            mode = Mode::Numeric;
                        } else if measure_alnum(&src[i..]) >= verdep(11, 15, 16) {
                            mode = Mode::Alnum;
                        }
                    }
                    Mode::Alnum => {
                        if len_cmp_8bit(&src[i..]) > 0 {
                            mode = Mode::Byte;
                        } else if measure_numeric(&src[i..]) >= verdep(13, 15, 17) {
                            mode = Mode::Numeric;
                        }
                    }
                    Mode::Numeric => {
                        if len_cmp_8bit(&src[i..]) > 0 {
                            mode = Mode::Byte;
                        } else if len_cmp_alnum(&src[i..]) > 0 {
                            mode = Mode::Alnum;
                        }
                    }
                }
            }

            if mode != last_mode {
                let l = self.flush(last_mode, &src[last_i..], i - last_i);
                if last_i + l < i {
                    return last_i + l;
                }
                last_mode = mode;
                last_i = i;
            }

            i += byte_len;
        }

        last_i + self.flush(last_mode, &src[last_i..], len - last_i)
    }

    /// terminator, zero alignment, alternating 0xEC / 0x11 pad words;
    /// yields exactly `ceil(cap_bits / 8)` data words
    pub fn finalize(mut self) -> Option<Vec<u8>> {
        match self.version {
            Version::Micro(m) => {
                if !self.put(0, 3 + 2 * (m as u32 - 1)) {
                    return None;
                }
            }
            Version::Rect(_) => {
                if !self.put(RMQR_MODE_END, 3) {
                    return None;
                }
            }
            Version::Qr(_) => {
                if !self.put(0, 4) {
                    return None;
                }
            }
            Version::Tqr => {
                if self.bits != 4 * 10 {
                    return None;
                }
            }
        }
        if self.overflow {
            return None;
        }

        if self.bits % 8 != 0 {
            let pad = (8 - self.bits % 8).min(self.cap_bits - self.bits);
            self.put(0, pad);
        }

        let mut flip = false;
        while self.bits < self.cap_bits / 8 * 8 {
            flip = !flip;
            self.put(if flip { 0xEC } else { 0x11 }, 8);
        }
        // a trailing half word (M1 / M3) stays zero
        if self.bits < self.cap_bits {
            let n = self.cap_bits - self.bits;
            self.put(0, n);
        }
        if self.overflow {
            return None;
        }

        self.w.byte_align().unwrap();
        Some(self.w.into_writer())
    }
}

struct Bits<'a> {
    r: BitReader<Cursor<&'a [u8]>, BigEndian>,
    remaining: u32,
}

impl<'a> Bits<'a> {
    fn new(words: &'a [u8], bits: u32) -> Bits<'a> {
        Bits { r: BitReader::endian(Cursor::new(words), BigEndian), remaining: bits.min(words.len() as u32 * 8) }
    }

    fn take(&mut self, n: u32) -> Option<u32> {
        if n == 0 {
            return Some(0);
        }
        if self.remaining < n {
            self.remaining = 0;
            return None;
        }
        self.remaining -= n;
        self.r.read::<u32>(n).ok()
    }

    fn is_end(&self) -> bool {
        self.remaining == 0
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Parse de-interleaved data words back into text. Unknown modes or a
/// truncated stream simply end the parse; whatever was recovered up to
/// that point is returned.
pub fn parse(words: &[u8], data_bits: u32, version: Version, initial_eci: EciCode) -> Vec<u8> {
    let mut out = Vec::new();
    parse_inner(&mut Bits::new(words, data_bits), version, initial_eci, &mut out);
    out
}

fn parse_inner(bits: &mut Bits, version: Version, initial_eci: EciCode, out: &mut Vec<u8>) -> Option<()> {
    let mut eci = initial_eci;
    let mut mode = Mode::Numeric; // for mQR and tQR

    while !bits.is_end() {
        enum Op {
            Data(Mode),
            End,
            Eci,
            Structured,
        }

        let op = match version {
            Version::Micro(m) => {
                if m != 1 {
                    mode = match bits.take(m as u32 - 1)? {
                        0 => Mode::Numeric,
                        1 => Mode::Alnum,
                        2 => Mode::Byte,
                        _ => Mode::Kanji,
                    };
                }
                Op::Data(mode)
            }
            Version::Qr(_) => match bits.take(4)? {
                0 => Op::End,
                QR_MODE_NUMERIC => Op::Data(Mode::Numeric),
                QR_MODE_ALNUM => Op::Data(Mode::Alnum),
                QR_MODE_BYTE => Op::Data(Mode::Byte),
                QR_MODE_KANJI => Op::Data(Mode::Kanji),
                QR_MODE_ECI => Op::Eci,
                QR_MODE_STRUCTURED => Op::Structured,
                m => {
                    debug!("unknown mode: {:04b}", m);
                    return Some(());
                }
            },
            Version::Rect(_) => match bits.take(3)? {
                RMQR_MODE_END => Op::End,
                1 => Op::Data(Mode::Numeric),
                2 => Op::Data(Mode::Alnum),
                3 => Op::Data(Mode::Byte),
                4 => Op::Data(Mode::Kanji),
                m => {
                    debug!("unknown mode: {:03b}", m);
                    return Some(());
                }
            },
            Version::Tqr => Op::Data(Mode::Numeric),
        };

        match op {
            Op::End => return Some(()),

            Op::Eci => {
                let v = if bits.take(1)? == 0 {
                    bits.take(7)?
                } else if bits.take(1)? == 0 {
                    bits.take(14)?
                } else if bits.take(1)? == 0 {
                    bits.take(21)?
                } else {
                    return Some(()); // unsupported
                };
                eci = EciCode::from_value(v);
            }

            Op::Structured => {
                let a = bits.take(8)?;
                let b = bits.take(8)?;
                debug!("structured append ignored: {} {}", a, b);
            }

            Op::Data(Mode::Numeric) => {
                let mut len = bits.take(tables::length_bits(version, 0))?;
                if version.is_tqr() {
                    len = 12;
                }
                if len == 0 {
                    return Some(());
                }
                while len > 0 {
                    let width = if len >= 3 { 10 } else if len == 2 { 7 } else { 4 };
                    let v = bits.take(width)?;
                    if len >= 3 {
                        if v / 100 >= 10 {
                            debug!("out of range numeric group {}", v);
                        }
                        out.push(b'0' + (v / 100 % 10) as u8);
                        len -= 1;
                    }
                    if len >= 2 {
                        out.push(b'0' + (v / 10 % 10) as u8);
                        len -= 1;
                    }
                    out.push(b'0' + (v % 10) as u8);
                    len -= 1;
                }
            }

            Op::Data(Mode::Alnum) => {
                let mut len = bits.take(tables::length_bits(version, 1))?;
                if len == 0 {
                    return Some(());
                }
                while len > 0 {
                    let v = bits.take(if len >= 2 { 11 } else { 6 })?;
                    if len >= 2 {
                        if v / 45 >= 45 {
                            debug!("out of range alnum pair {}", v);
                        }
                        out.push(ALNUM[(v / 45 % 45) as usize]);
                        len -= 1;
                        if len == 0 {
                            break;
                        }
                    }
                    out.push(ALNUM[(v % 45) as usize]);
                    len -= 1;
                }
            }

            Op::Data(Mode::Byte) => {
                let mut len = bits.take(tables::length_bits(version, 2))?;
                if len == 0 {
                    return Some(());
                }
                while len > 0 {
                    match eci {
                        EciCode::Utf8 => {
                            let lead = bits.take(8)?;
                            len -= 1;
                            let cont = match lead {
                                0x00..=0x7F => 0,
                                0xC0..=0xDF => 1,
                                0xE0..=0xEF => 2,
                                0xF0..=0xF7 => 3,
                                _ => 0,
                            }
                            .min(len);
                            let mut code = match cont {
                                0 => lead & 0x7F,
                                1 => lead & 0x1F,
                                2 => lead & 0x0F,
                                _ => lead & 0x07,
                            };
                            let mut ok = true;
                            for _ in 0..cont {
                                let b = bits.take(8)?;
                                len -= 1;
                                if b & 0xC0 != 0x80 {
                                    ok = false;
                                }
                                code = (code << 6) | (b & 0x3F);
                            }
                            let c = if ok { std::char::from_u32(code) } else { None };
                            push_char(out, c.unwrap_or('?'));
                        }
                        EciCode::ShiftJis => {
                            let b1 = bits.take(8)? as u8;
                            len -= 1;
                            let two = matches!(b1, 0x81..=0x9F | 0xE0..=0xFC) && len >= 1;
                            let (c, _) = if two {
                                let b2 = bits.take(8)? as u8;
                                len -= 1;
                                kanji::sjis_to_unicode(b1, b2)
                            } else {
                                kanji::sjis_to_unicode(b1, 0)
                            };
                            push_char(out, c);
                        }
                        _ => {
                            out.push(bits.take(8)? as u8);
                            len -= 1;
                        }
                    }
                }
            }

            Op::Data(Mode::Kanji) => {
                let mut len = bits.take(tables::length_bits(version, 3))?;
                if len == 0 {
                    return Some(());
                }
                while len > 0 {
                    let idx = bits.take(13)? as u16;
                    if let Some(c) = kanji::index_to_unicode(idx) {
                        push_char(out, c);
                    }
                    len -= 1;
                }
            }
        }
    }

    Some(())
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EciCode, Version};

    fn roundtrip(version: Version, cap_bits: u32, input: &[u8]) -> Vec<u8> {
        let mut w = SegmentWriter::new(version, cap_bits, EciCode::Latin1);
        assert_eq!(w.write_auto(input), input.len());
        let words = w.finalize().expect("must fit");
        assert_eq!(words.len() as u32, (cap_bits + 7) / 8);
        parse(&words, cap_bits, version, EciCode::Latin1)
    }

    #[test]
    fn test_numeric_bit_layout() {
        // 4 (mode) + 10 (count) + 10 + 10 + 10 + 4 = 48 bits
        let mut w = SegmentWriter::new(Version::Qr(1), 16 * 8, EciCode::Latin1);
        assert_eq!(w.write_auto(b"0123456789"), 10);
        assert_eq!(w.bits_written(), 44);
        let words = w.finalize().unwrap();
        assert_eq!(words[0], 0b0001_0000); // numeric, count 10 starts
        assert_eq!(parse(&words, 16 * 8, Version::Qr(1), EciCode::Latin1), b"0123456789");
    }

    #[test]
    fn test_byte_roundtrip() {
        let url = b"https://example.com/a?b=c";
        assert_eq!(roundtrip(Version::Qr(3), 44 * 8, url), url);
    }

    #[test]
    fn test_alnum_roundtrip() {
        assert_eq!(roundtrip(Version::Qr(2), 28 * 8, b"HELLO WORLD $1/2"), b"HELLO WORLD $1/2");
    }

    #[test]
    fn test_greedy_switches_to_numeric_after_long_digit_run() {
        // lowercase forces byte mode; >= 6 digits (version band 0) flips
        let input = b"ab0123456789";
        let mut w = SegmentWriter::new(Version::Qr(2), 28 * 8, EciCode::Latin1);
        assert_eq!(w.write_auto(input), input.len());
        // byte segment: 4 + 8 + 16; numeric: 4 + 10 + 34 digits bits
        assert_eq!(w.bits_written(), 4 + 8 + 2 * 8 + 4 + 10 + 34);
        let words = w.finalize().unwrap();
        assert_eq!(parse(&words, 28 * 8, Version::Qr(2), EciCode::Latin1), input);
    }

    #[test]
    fn test_short_digit_run_stays_byte() {
        let input = b"ab123cd";
        let mut w = SegmentWriter::new(Version::Qr(1), 16 * 8, EciCode::Latin1);
        assert_eq!(w.write_auto(input), input.len());
        assert_eq!(w.bits_written(), 4 + 8 + 7 * 8);
        let words = w.finalize().unwrap();
        assert_eq!(parse(&words, 16 * 8, Version::Qr(1), EciCode::Latin1), input);
    }

    #[test]
    fn test_capacity_overflow_reports_short_write() {
        let mut w = SegmentWriter::new(Version::Qr(1), 16 * 8, EciCode::Latin1);
        let long = [b'7'; 60];
        let consumed = w.write_auto(&long);
        assert!(consumed < 60 || w.finalize().is_none());
    }

    #[test]
    fn test_kanji_roundtrip_utf8_eci() {
        let input = "日本語".as_bytes();
        let mut w = SegmentWriter::new(Version::Qr(1), 16 * 8, EciCode::Utf8);
        assert_eq!(w.write_auto(input), input.len());
        // 4 (mode) + 8 (count) + 3 * 13 bits
        assert_eq!(w.bits_written(), 4 + 8 + 3 * 13);
        let words = w.finalize().unwrap();
        assert_eq!(parse(&words, 16 * 8, Version::Qr(1), EciCode::Latin1), input);
    }

    #[test]
    fn test_eci_header_emitted_for_utf8_bytes() {
        let input = "héllo".as_bytes(); // not kanji-mappable, not latin alnum
        let mut w = SegmentWriter::new(Version::Qr(2), 28 * 8, EciCode::Utf8);
        assert_eq!(w.write_auto(input), input.len());
        let words = w.finalize().unwrap();
        // ECI segment: 0111 then assignment 26 in 8 bits
        assert_eq!(words[0] >> 4, 0b0111);
        assert_eq!((words[0] as u32 & 0xF) << 4 | (words[1] >> 4) as u32, 26);
        let out = parse(&words, 28 * 8, Version::Qr(2), EciCode::Latin1);
        assert_eq!(out, input);
    }

    #[test]
    fn test_micro_m1_numeric_only() {
        let mut w = SegmentWriter::new(Version::Micro(1), 20, EciCode::Latin1);
        assert_eq!(w.write_auto(b"123"), 3);
        // no mode bits: 3 (count) + 10 = 13, terminator 3, padded to 20
        let words = w.finalize().unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(parse(&words, 20, Version::Micro(1), EciCode::Latin1), b"123");
    }

    #[test]
    fn test_tqr_exactly_twelve_digits() {
        let mut w = SegmentWriter::new(Version::Tqr, 40, EciCode::Latin1);
        assert_eq!(w.write_auto(b"123456789012"), 12);
        let words = w.finalize().unwrap();
        assert_eq!(parse(&words, 40, Version::Tqr, EciCode::Latin1), b"123456789012");

        let mut w = SegmentWriter::new(Version::Tqr, 40, EciCode::Latin1);
        assert_eq!(w.write_auto(b"1234"), 4);
        assert!(w.finalize().is_none()); // short payloads do not finalize
    }
}
