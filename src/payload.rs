/// The interleaved codeword buffer sitting between the segment codec and
/// the canvas. All sizing is derived from (version, level); the data-word
/// and error-word iterators realise the column-major-over-blocks ordering
/// of the standard, so block-wise RS encode and decode stay in place.

use crate::bitstream::{BitBuffer, BitPos, BitStream, PosIter};
use crate::config::{EccLevel, SymbolConfig, Version};
use crate::error::QrError;
use crate::galois::Poly;
use crate::rscoding;
use crate::tables;
use crate::{code_rmqr, code_tqr};

#[derive(Clone, Copy, Debug)]
struct Sizing {
    total_bits: u32,
    data_bits: u32,
    data_words: u32,
    error_words: u32,
    total_blocks: u32,
    small_blocks: u32,
    large_blocks: u32,
    dw_small: u32,
    dw_large: u32,
    ew_in_block: u32,
    half_word: bool, // M1 / M3 carry a final 4-bit data word
}

pub struct Payload {
    pub version: Version,
    pub level: EccLevel,
    sz: Sizing,
    buffer: BitBuffer,
}

impl Payload {
    pub fn new(version: Version, level: EccLevel) -> Result<Payload, QrError> {
        let sz = match version {
            Version::Qr(v) => {
                let total_bits = tables::qr_available_bits(v);
                let total_words = total_bits / 8;
                let total_blocks = tables::qr_total_blocks(v, level);
                let ew_in_block = tables::qr_error_words_in_block(v, level);
                let error_words = ew_in_block * total_blocks;
                let data_words = total_words - error_words;
                Sizing::split(total_bits, data_words, error_words, total_blocks, ew_in_block, false)
            }
            Version::Micro(m) => {
                let cap = tables::MICRO_CAPACITY_TABLE
                    .get(&SymbolConfig::new(version, level))
                    .ok_or(QrError::InvalidParameter("level"))?;
                let total_bits = tables::micro_available_bits(m);
                let error_words = cap.total_words - cap.data_words;
                Sizing::split(total_bits, cap.data_words, error_words, 1, error_words, m == 1 || m == 3)
            }
            Version::Rect(i) => {
                if !matches!(level, EccLevel::M | EccLevel::H) {
                    return Err(QrError::InvalidParameter("level"));
                }
                let total_bits = code_rmqr::available_bits(i);
                let total_words = total_bits / 8;
                let (total_blocks, ew_in_block) = tables::rmqr_ecc_split(total_words, level);
                let error_words = ew_in_block * total_blocks;
                let data_words = total_words - error_words;
                Sizing::split(total_bits, data_words, error_words, total_blocks, ew_in_block, false)
            }
            Version::Tqr => Sizing::split(code_tqr::DATA_BITS, 5, 14, 1, 14, false),
        };

        Ok(Payload { version, level, sz, buffer: BitBuffer::new(sz.total_bits) })
    }

    pub fn total_bits(&self) -> u32 {
        self.sz.total_bits
    }

    pub fn data_bits(&self) -> u32 {
        self.sz.data_bits
    }

    pub fn data_words(&self) -> u32 {
        self.sz.data_words
    }

    pub fn error_words(&self) -> u32 {
        self.sz.error_words
    }

    pub fn total_blocks(&self) -> u32 {
        self.sz.total_blocks
    }

    /// the whole buffer in wire order
    pub fn bitstream(&mut self) -> BitStream<BitBuffer> {
        let bits = self.sz.total_bits;
        BitStream::with_len(&mut self.buffer, bits)
    }

    pub fn data_iter(&self) -> PosIter<'static> {
        let sz = self.sz;
        Box::new(move |i| sz.data_pos(i))
    }

    pub fn error_iter(&self) -> PosIter<'static> {
        let sz = self.sz;
        Box::new(move |i| sz.error_pos(i))
    }

    fn data_bitstream(&mut self) -> BitStream<BitBuffer> {
        let sz = self.sz;
        BitStream::with_iter(&mut self.buffer, Box::new(move |i| sz.data_pos(i)))
    }

    fn error_bitstream(&mut self) -> BitStream<BitBuffer> {
        let sz = self.sz;
        BitStream::with_iter(&mut self.buffer, Box::new(move |i| sz.error_pos(i)))
    }

    /// logical data words, de-interleaved
    pub fn read_data_words(&mut self) -> Vec<u8> {
        let n = self.sz.data_words;
        let mut bs = self.data_bitstream();
        (0..n).map(|_| bs.read_bits(8) as u8).collect()
    }

    pub fn write_data_words(&mut self, words: &[u8]) {
        let mut bs = self.data_bitstream();
        for &w in words {
            bs.write_bits(w as u32, 8);
        }
    }

    fn read_error_words(&mut self) -> Vec<u8> {
        let n = self.sz.error_words;
        let mut bs = self.error_bitstream();
        (0..n).map(|_| bs.read_bits(8) as u8).collect()
    }

    fn write_error_words(&mut self, words: &[u8]) {
        let mut bs = self.error_bitstream();
        for &w in words {
            bs.write_bits(w as u32, 8);
        }
    }

    fn block_data_words(&self, block: u32) -> u32 {
        if block < self.sz.small_blocks {
            self.sz.dw_small
        } else {
            self.sz.dw_large
        }
    }

    /// compute and store the RS parity for every block
    pub fn set_error_words(&mut self) {
        let sz = self.sz;
        let gen = rscoding::generator_poly(sz.ew_in_block as usize);

        let data = self.read_data_words();
        let mut parity_out = Vec::with_capacity(sz.error_words as usize);

        let mut off = 0usize;
        for block in 0..sz.total_blocks {
            let dw = self.block_data_words(block) as usize;
            let ew = sz.ew_in_block as usize;

            // I(x) = data * x^t
            let mut shifted = Poly::zero(dw + ew - 1);
            for i in 0..dw {
                shifted.set_coeff(ew + dw - i - 1, data[off + i]);
            }
            let parity = rscoding::calc_parity(&shifted, &gen);
            for i in 0..ew {
                parity_out.push(parity.coeff(ew - i - 1));
            }
            off += dw;
        }

        self.write_error_words(&parity_out);
    }

    /// Run the RS decoder over every block, writing corrections back.
    /// Returns the number of corrected symbols.
    pub fn fix_errors(&mut self) -> Result<usize, QrError> {
        let sz = self.sz;
        let mut data = self.read_data_words();
        let mut error = self.read_error_words();

        let mut fixed_total = 0;
        let mut dirty = false;

        let mut doff = 0usize;
        let mut eoff = 0usize;
        for block in 0..sz.total_blocks {
            let dw = self.block_data_words(block) as usize;
            let ew = sz.ew_in_block as usize;
            let codelen = dw + ew;

            let mut r = Poly::zero(codelen - 1);
            for i in 0..dw {
                r.set_coeff(codelen - i - 1, data[doff + i]);
            }
            for i in 0..ew {
                r.set_coeff(ew - i - 1, error[eoff + i]);
            }

            let fixed = rscoding::fix_errors(&mut r, codelen, ew)?;
            if fixed > 0 {
                log::debug!("rs block #{}: {} error(s) fixed", block, fixed);
                fixed_total += fixed;
                dirty = true;
                for i in 0..dw {
                    data[doff + i] = r.coeff(codelen - i - 1);
                }
                for i in 0..ew {
                    error[eoff + i] = r.coeff(ew - i - 1);
                }
            }

            doff += dw;
            eoff += ew;
        }

        if dirty {
            self.write_data_words(&data);
            self.write_error_words(&error);
        }

        Ok(fixed_total)
    }
}

impl Sizing {
    fn split(total_bits: u32, data_words: u32, error_words: u32, total_blocks: u32, ew_in_block: u32, half_word: bool) -> Sizing {
        let large_blocks = data_words % total_blocks;
        let small_blocks = total_blocks - large_blocks;
        let dw_small = data_words / total_blocks;
        Sizing {
            total_bits,
            data_bits: data_words * 8 - if half_word { 4 } else { 0 },
            data_words,
            error_words,
            total_blocks,
            small_blocks,
            large_blocks,
            dw_small,
            dw_large: dw_small + 1,
            ew_in_block,
            half_word,
        }
    }

    fn data_pos(&self, i: u32) -> BitPos {
        if i >= self.data_bits {
            return BitPos::End;
        }
        if self.half_word {
            // single block, data bits laid out head first
            return BitPos::at(i);
        }

        let n = i / 8;
        let u = i % 8;

        if n < self.dw_small * self.small_blocks {
            let x = n % self.dw_small;
            let y = n / self.dw_small;
            BitPos::at((x * self.total_blocks + y) * 8 + u)
        } else {
            let n = n - self.dw_small * self.small_blocks;
            let x = n % self.dw_large;
            let y = n / self.dw_large;
            BitPos::at((self.small_blocks * (x + 1).min(self.dw_small) + self.large_blocks * x + y) * 8 + u)
        }
    }

    fn error_pos(&self, i: u32) -> BitPos {
        if i >= self.error_words * 8 {
            return BitPos::End;
        }
        if self.half_word {
            return BitPos::at(self.data_bits + i);
        }

        let n = i / 8;
        let u = i % 8;
        let x = n % self.ew_in_block;
        let y = n / self.ew_in_block;
        BitPos::at((x * self.total_blocks + y + self.data_words) * 8 + u)
    }
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitStore;

    fn positions(payload: &Payload) -> Vec<u32> {
        let mut seen = Vec::new();
        let it = payload.data_iter();
        let mut i = 0;
        loop {
            match it(i) {
                BitPos::End => break,
                BitPos::At { pos, .. } => seen.push(pos),
                _ => {}
            }
            i += 1;
        }
        let it = payload.error_iter();
        let mut i = 0;
        loop {
            match it(i) {
                BitPos::End => break,
                BitPos::At { pos, .. } => seen.push(pos),
                _ => {}
            }
            i += 1;
        }
        seen
    }

    #[test]
    fn test_sizing_v1m() {
        let p = Payload::new(Version::Qr(1), EccLevel::M).unwrap();
        assert_eq!(p.total_bits(), 208);
        assert_eq!(p.data_words(), 16);
        assert_eq!(p.error_words(), 10);
        assert_eq!(p.total_blocks(), 1);
    }

    #[test]
    fn test_sizing_v5q_blocks() {
        // 5-Q: 4 blocks, two of them large
        let p = Payload::new(Version::Qr(5), EccLevel::Q).unwrap();
        assert_eq!(p.total_blocks(), 4);
        assert_eq!(p.sz.small_blocks + p.sz.large_blocks, 4);
        assert_eq!(
            p.sz.dw_small * p.sz.small_blocks + p.sz.dw_large * p.sz.large_blocks,
            p.data_words()
        );
        assert_eq!(p.data_words() + p.error_words(), p.total_bits() / 8);
    }

    #[test]
    fn test_interleave_is_a_permutation() {
        for &(v, l) in &[
            (Version::Qr(1), EccLevel::M),
            (Version::Qr(5), EccLevel::Q),
            (Version::Qr(13), EccLevel::H),
            (Version::Micro(3), EccLevel::M),
            (Version::Tqr, EccLevel::M),
        ] {
            let p = Payload::new(v, l).unwrap();
            let mut seen = positions(&p);
            seen.sort_unstable();
            seen.dedup();
            // the concatenation covers every codeword bit exactly once
            assert_eq!(seen.len() as u32, p.data_bits() + p.error_words() * 8);
            assert!(seen.iter().all(|&pos| pos < p.total_bits()));
        }
    }

    #[test]
    fn test_rs_roundtrip_with_injected_errors() {
        let mut p = Payload::new(Version::Qr(2), EccLevel::M).unwrap();
        let words: Vec<u8> = (0..p.data_words() as u8).map(|i| i.wrapping_mul(7).wrapping_add(3)).collect();
        p.write_data_words(&words);
        p.set_error_words();

        // clean decode first
        assert_eq!(p.fix_errors().unwrap(), 0);

        // flip a few bits inside the buffer (2-M corrects up to 8 words)
        for &bit in &[3u32, 77, 200] {
            let v = p.buffer.read_bit_at(bit);
            p.buffer.write_bit_at(bit, !v);
        }
        assert!(p.fix_errors().unwrap() > 0);
        assert_eq!(p.read_data_words(), words);
    }

    #[test]
    fn test_micro_half_word_layout() {
        let mut p = Payload::new(Version::Micro(1), EccLevel::L).unwrap();
        assert_eq!(p.total_bits(), 36);
        assert_eq!(p.data_bits(), 20);
        // the half word reads back with its low nibble forced to zero
        p.write_data_words(&[0xAB, 0xCD, 0xEF]);
        assert_eq!(p.read_data_words(), vec![0xAB, 0xCD, 0xE0]);
        p.set_error_words();
        assert_eq!(p.fix_errors().unwrap(), 0);
    }

    #[test]
    fn test_rmqr_sizing_holds_together() {
        for i in 0..30u8 {
            for &l in &[EccLevel::M, EccLevel::H] {
                let p = Payload::new(Version::Rect(i), l).unwrap();
                assert!(p.data_words() >= 1);
                assert_eq!(p.data_words() + p.error_words(), p.total_bits() / 8);
            }
        }
    }
}
