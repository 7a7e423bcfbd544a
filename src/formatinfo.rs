/// Format info and version info codecs. Both are short BCH codes decoded
/// by scanning the legal codeword table for a Hamming distance of at most
/// three; anything further away is reported as unreadable.

use crate::config::{CodeType, EccLevel, Version};
use crate::tables::{BCH_15_5, BCH_18_6, RMQR_DIMS};

pub fn hamming_distance(a: u32, b: u32) -> u32 {
    (a ^ b).count_ones()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    pub value: u32,
    /// carried by the format word itself for mQR and rMQR
    pub version: Option<Version>,
    pub level: EccLevel,
    pub mask: u8,
}

// symbol numbers of table 13 in the micro QR chapter
static MICRO_SYMBOL_NUMBERS: [(u8, EccLevel); 8] = [
    (1, EccLevel::L),
    (2, EccLevel::L),
    (2, EccLevel::M),
    (3, EccLevel::L),
    (3, EccLevel::M),
    (4, EccLevel::L),
    (4, EccLevel::M),
    (4, EccLevel::Q),
];

impl FormatInfo {
    pub fn encode(version: Version, level: EccLevel, mask: u8) -> Option<FormatInfo> {
        match version {
            Version::Qr(_) => {
                if mask >= 8 {
                    return None;
                }
                let value = BCH_15_5[((level.format_bits() << 3) | mask as u32) as usize] as u32;
                Some(FormatInfo { value, version: None, level, mask })
            }
            Version::Micro(m) => {
                if mask >= 4 {
                    return None;
                }
                let sym = MICRO_SYMBOL_NUMBERS.iter().position(|&(v, l)| v == m && l == level)? as u32;
                let value = BCH_15_5[((sym << 2) | mask as u32) as usize] as u32;
                Some(FormatInfo { value, version: Some(version), level, mask })
            }
            Version::Rect(i) => {
                let bit = match level {
                    EccLevel::M => 0,
                    EccLevel::H => 1,
                    _ => return None,
                };
                let value = BCH_18_6[((i as u32) << 1 | bit) as usize];
                Some(FormatInfo { value, version: Some(version), level, mask: 0 })
            }
            Version::Tqr => None, // tQR has no format info
        }
    }

    /// Hamming-closest decode of a received format word.
    pub fn decode(kind: CodeType, value: u32) -> Option<FormatInfo> {
        match kind {
            CodeType::Qr => {
                for (i, &w) in BCH_15_5.iter().enumerate() {
                    if hamming_distance(w as u32, value) <= 3 {
                        return Some(FormatInfo {
                            value: w as u32,
                            version: None,
                            level: EccLevel::from_format_bits(i as u32 >> 3),
                            mask: (i & 7) as u8,
                        });
                    }
                }
                None
            }
            CodeType::MicroQr => {
                for (i, &w) in BCH_15_5.iter().enumerate() {
                    if hamming_distance(w as u32, value) <= 3 {
                        let (m, level) = MICRO_SYMBOL_NUMBERS[i >> 2];
                        return Some(FormatInfo {
                            value: w as u32,
                            version: Some(Version::Micro(m)),
                            level,
                            mask: (i & 3) as u8,
                        });
                    }
                }
                None
            }
            CodeType::Rmqr => {
                for (i, &w) in BCH_18_6.iter().enumerate() {
                    if hamming_distance(w, value) <= 3 {
                        let idx = i >> 1;
                        if idx >= RMQR_DIMS.len() {
                            return None;
                        }
                        return Some(FormatInfo {
                            value: w,
                            version: Some(Version::Rect(idx as u8)),
                            level: if i & 1 != 0 { EccLevel::H } else { EccLevel::M },
                            mask: 0,
                        });
                    }
                }
                None
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    pub value: u32,
    pub version: u8,
}

impl VersionInfo {
    /// only QR versions 7..40 carry version info
    pub fn encode(version: u8) -> Option<VersionInfo> {
        if !(7..=40).contains(&version) {
            return None;
        }
        Some(VersionInfo { value: BCH_18_6[version as usize], version })
    }

    pub fn decode(value: u32) -> Option<VersionInfo> {
        for v in 7..=40u8 {
            if hamming_distance(BCH_18_6[v as usize], value) <= 3 {
                return Some(VersionInfo { value: BCH_18_6[v as usize], version: v });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_format_roundtrip_under_3_bit_noise() {
        for level in [EccLevel::L, EccLevel::M, EccLevel::Q, EccLevel::H].iter().copied() {
            for mask in 0..8u8 {
                let fi = FormatInfo::encode(Version::Qr(1), level, mask).unwrap();
                // every 3-bit error pattern still decodes to the original
                for e in 0..15 {
                    for f in 0..15 {
                        for g in 0..15 {
                            let noisy = fi.value ^ (1 << e) ^ (1 << f) ^ (1 << g);
                            let back = FormatInfo::decode(CodeType::Qr, noisy).unwrap();
                            assert_eq!((back.level, back.mask), (level, mask));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_micro_format_carries_version() {
        let fi = FormatInfo::encode(Version::Micro(3), EccLevel::M, 2).unwrap();
        let back = FormatInfo::decode(CodeType::MicroQr, fi.value).unwrap();
        assert_eq!(back.version, Some(Version::Micro(3)));
        assert_eq!(back.level, EccLevel::M);
        assert_eq!(back.mask, 2);

        // M1 has no Q level
        assert!(FormatInfo::encode(Version::Micro(1), EccLevel::Q, 0).is_none());
    }

    #[test]
    fn test_rmqr_format_carries_version_and_level() {
        let v = Version::from_str("R13x99").unwrap();
        let fi = FormatInfo::encode(v, EccLevel::H, 0).unwrap();
        let back = FormatInfo::decode(CodeType::Rmqr, fi.value).unwrap();
        assert_eq!(back.version, Some(v));
        assert_eq!(back.level, EccLevel::H);
    }

    #[test]
    fn test_version_info() {
        assert!(VersionInfo::encode(6).is_none());
        let vi = VersionInfo::encode(7).unwrap();
        assert_eq!(vi.value, 0x07C94);
        assert_eq!(VersionInfo::decode(vi.value ^ 0b101).unwrap().version, 7);
    }
}
