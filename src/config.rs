/// Contains enums and structs that will also be exported as the public
/// API of this crate.
use itertools::Itertools;

use crate::error::QrError;
use crate::tables::RMQR_DIMS;

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum CodeType {
    Qr,      // classic QR, versions 1 through 40
    MicroQr, // micro QR, M1 through M4
    Rmqr,    // rectangular micro QR, R7x43 through R17x139
    Tqr,     // fixed 19x19 tQR variant
    Ean13,
    Ean8,
    UpcA,
    Code39,
    Code93,
    Itf,
    Nw7,
}

impl CodeType {
    pub fn is_qr_family(self) -> bool {
        matches!(self, CodeType::Qr | CodeType::MicroQr | CodeType::Rmqr | CodeType::Tqr)
    }

    pub fn is_barcode(self) -> bool {
        !self.is_qr_family()
    }

    pub fn name(self) -> &'static str {
        match self {
            CodeType::Qr => "QR",
            CodeType::MicroQr => "mQR",
            CodeType::Rmqr => "rMQR",
            CodeType::Tqr => "tQR",
            CodeType::Ean13 => "EAN13",
            CodeType::Ean8 => "EAN8",
            CodeType::UpcA => "UPCA",
            CodeType::Code39 => "CODE39",
            CodeType::Code93 => "CODE93",
            CodeType::Itf => "ITF",
            CodeType::Nw7 => "NW7",
        }
    }

    pub fn from_str(s: &str) -> Result<CodeType, QrError> {
        match s.to_ascii_lowercase().as_str() {
            "qr" => Ok(CodeType::Qr),
            "mqr" => Ok(CodeType::MicroQr),
            "rmqr" => Ok(CodeType::Rmqr),
            "tqr" => Ok(CodeType::Tqr),
            "ean8" | "jan8" | "ean-8" | "jan-8" => Ok(CodeType::Ean8),
            "ean13" | "jan13" | "ean-13" | "jan-13" => Ok(CodeType::Ean13),
            "upca" => Ok(CodeType::UpcA),
            "code39" => Ok(CodeType::Code39),
            "code93" => Ok(CodeType::Code93),
            "itf" | "i25" => Ok(CodeType::Itf),
            "nw7" | "nw-7" | "codabar" => Ok(CodeType::Nw7),
            _ => Err(QrError::InvalidParameter("code type")),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum EccLevel {
    L, // allows recovery of  7% of the data
    M, // allows recovery of 15% of the data
    Q, // allows recovery of 25% of the data
    H, // allows recovery of 30% of the data
}

impl EccLevel {
    pub fn from_str(desc: &str) -> Result<EccLevel, QrError> {
        match desc {
            "L" | "l" => Ok(EccLevel::L),
            "M" | "m" => Ok(EccLevel::M),
            "Q" | "q" => Ok(EccLevel::Q),
            "H" | "h" => Ok(EccLevel::H),
            _ => Err(QrError::InvalidParameter("ecc level")),
        }
    }

    /// the two bits carried in the QR format info
    pub fn format_bits(self) -> u32 {
        match self {
            EccLevel::L => 0b01,
            EccLevel::M => 0b00,
            EccLevel::Q => 0b11,
            EccLevel::H => 0b10,
        }
    }

    pub fn from_format_bits(bits: u32) -> EccLevel {
        match bits & 3 {
            0b01 => EccLevel::L,
            0b00 => EccLevel::M,
            0b11 => EccLevel::Q,
            _ => EccLevel::H,
        }
    }

    pub fn index(self) -> usize {
        match self {
            EccLevel::L => 0,
            EccLevel::M => 1,
            EccLevel::Q => 2,
            EccLevel::H => 3,
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum MaskPattern {
    Auto,
    Pattern(u8), // 0..8 for QR, 0..4 for micro QR, 0 for rMQR
}

impl MaskPattern {
    pub fn from_str(s: &str) -> Result<MaskPattern, QrError> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(MaskPattern::Auto);
        }
        match s.parse::<u8>() {
            Ok(i) if i < 8 => Ok(MaskPattern::Pattern(i)),
            _ => Err(QrError::InvalidParameter("mask pattern")),
        }
    }
}

/// Extended Channel Interpretation assignment for Byte-mode data.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum EciCode {
    Latin1,
    ShiftJis,
    Utf8,
    Other(u32), // passed through verbatim
}

impl EciCode {
    pub fn value(self) -> u32 {
        match self {
            EciCode::Latin1 => 3,
            EciCode::ShiftJis => 20,
            EciCode::Utf8 => 26,
            EciCode::Other(v) => v,
        }
    }

    pub fn from_value(v: u32) -> EciCode {
        match v {
            3 => EciCode::Latin1,
            20 => EciCode::ShiftJis,
            26 => EciCode::Utf8,
            v => EciCode::Other(v),
        }
    }
}

/// How `write_buffer` should treat the input.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum DataType {
    Auto,
    Numeric,
    Alnum,
    Bytes,
    Kanji,
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub enum Version {
    Qr(u8),    // 1 through 40
    Micro(u8), // M1 through M4
    Rect(u8),  // index into RMQR_DIMS, R7x43 through R17x139
    Tqr,       // fixed 19x19
}

impl Version {
    pub fn width(self) -> u16 {
        match self {
            Version::Qr(v) => 17 + 4 * v as u16,
            Version::Micro(m) => 9 + 2 * m as u16,
            Version::Rect(i) => RMQR_DIMS[i as usize].1 as u16,
            Version::Tqr => 19,
        }
    }

    pub fn height(self) -> u16 {
        match self {
            Version::Rect(i) => RMQR_DIMS[i as usize].0 as u16,
            other => other.width(),
        }
    }

    pub fn is_qr(self) -> bool {
        matches!(self, Version::Qr(_))
    }

    pub fn is_micro(self) -> bool {
        matches!(self, Version::Micro(_))
    }

    pub fn is_rect(self) -> bool {
        matches!(self, Version::Rect(_))
    }

    pub fn is_tqr(self) -> bool {
        self == Version::Tqr
    }

    /// the version band used by the length fields and the mode-switch
    /// thresholds; micro, rectangular and tQR symbols sort past QR 40
    pub fn band(self) -> usize {
        match self {
            Version::Qr(v) if v < 10 => 0,
            Version::Qr(v) if v < 27 => 1,
            _ => 2,
        }
    }

    pub fn code_type(self) -> CodeType {
        match self {
            Version::Qr(_) => CodeType::Qr,
            Version::Micro(_) => CodeType::MicroQr,
            Version::Rect(_) => CodeType::Rmqr,
            Version::Tqr => CodeType::Tqr,
        }
    }

    /// Parse a symbol version the way it is commonly written: "7", "M3",
    /// "R13x77", "tQR".
    pub fn from_str(decl: &str) -> Result<Version, QrError> {
        if decl.eq_ignore_ascii_case("tqr") {
            return Ok(Version::Tqr);
        }
        if let Some(rest) = decl.strip_prefix('M').or_else(|| decl.strip_prefix('m')) {
            return match rest {
                "1" => Ok(Version::Micro(1)),
                "2" => Ok(Version::Micro(2)),
                "3" => Ok(Version::Micro(3)),
                "4" => Ok(Version::Micro(4)),
                _ => Err(QrError::InvalidParameter("micro QR version")),
            };
        }
        if let Some(rest) = decl.strip_prefix('R').or_else(|| decl.strip_prefix('r')) {
            let (h, w) = rest
                .split('x')
                .next_tuple()
                .ok_or(QrError::InvalidParameter("rMQR version"))?;
            let h: u8 = h.parse().map_err(|_| QrError::InvalidParameter("rMQR version"))?;
            let w: u8 = w.parse().map_err(|_| QrError::InvalidParameter("rMQR version"))?;
            for (i, &(dh, dw)) in RMQR_DIMS.iter().enumerate() {
                if dh == h && dw == w {
                    return Ok(Version::Rect(i as u8));
                }
            }
            return Err(QrError::InvalidParameter("rMQR version"));
        }
        match decl.parse::<u8>() {
            Ok(i) if i >= 1 && i <= 40 => Ok(Version::Qr(i)),
            _ => Err(QrError::InvalidParameter("version")),
        }
    }

    pub fn to_string(self) -> String {
        match self {
            Version::Qr(v) => format!("{}", v),
            Version::Micro(m) => format!("M{}", m),
            Version::Rect(i) => {
                let (h, w) = RMQR_DIMS[i as usize];
                format!("R{}x{}", h, w)
            }
            Version::Tqr => "tQR".to_string(),
        }
    }
}

/// A (version, level) pair, the key the sizing tables are indexed by.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolConfig(pub Version, pub EccLevel);

impl SymbolConfig {
    pub const fn new(v: Version, e: EccLevel) -> SymbolConfig {
        SymbolConfig(v, e)
    }

    /// Convenience parser for the form commonly used in the standard,
    /// such as 1-H, M3-L, R9x59-M, etc.
    pub fn from_str(decl: &str) -> Result<SymbolConfig, QrError> {
        let mut it = decl.rsplitn(2, '-');
        let e = it.next().ok_or(QrError::InvalidParameter("symbol config"))?;
        let v = it.next().ok_or(QrError::InvalidParameter("symbol config"))?;
        Ok(SymbolConfig::new(Version::from_str(v)?, EccLevel::from_str(e)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(Version::from_str("M2"), Ok(Version::Micro(2)));
        assert_eq!(Version::from_str("40"), Ok(Version::Qr(40)));
        assert_eq!(Version::from_str("tQR"), Ok(Version::Tqr));
        assert!(Version::from_str("41").is_err());
        assert!(Version::from_str("M5").is_err());

        let r = Version::from_str("R13x77").unwrap();
        assert_eq!(r.height(), 13);
        assert_eq!(r.width(), 77);
        assert_eq!(r.to_string(), "R13x77");
        assert!(Version::from_str("R11x27").is_err()); // narrower than 2h+9
    }

    #[test]
    fn test_symbol_config_parsing() {
        assert_eq!(
            SymbolConfig::from_str("M3-L"),
            Ok(SymbolConfig::new(Version::Micro(3), EccLevel::L))
        );
        assert_eq!(
            SymbolConfig::from_str("20-Q"),
            Ok(SymbolConfig::new(Version::Qr(20), EccLevel::Q))
        );
        assert_eq!(
            SymbolConfig::from_str("R9x59-H"),
            Ok(SymbolConfig::new(Version::Rect(6), EccLevel::H))
        );
    }

    #[test]
    fn test_symbol_sizes() {
        assert_eq!(Version::Qr(1).width(), 21);
        assert_eq!(Version::Qr(40).width(), 177);
        assert_eq!(Version::Micro(1).width(), 11);
        assert_eq!(Version::Micro(4).width(), 17);
        assert_eq!(Version::Tqr.width(), 19);
    }

    #[test]
    fn test_code_type_strings() {
        assert_eq!(CodeType::from_str("Codabar"), Ok(CodeType::Nw7));
        assert_eq!(CodeType::from_str("JAN-13"), Ok(CodeType::Ean13));
        assert!(CodeType::from_str("qrcode").is_err());
    }
}
