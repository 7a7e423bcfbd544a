use thiserror::Error;

/// Everything the crate can report to a caller. Detector internals absorb
/// most of these and simply move on to the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("input does not fit the selected symbol")]
    CapacityExceeded,

    #[error("symbol contents do not decode")]
    DecodeMismatch,

    #[error("too many errors for the Reed-Solomon code")]
    Uncorrectable,

    #[error("no finder pattern candidate produced a decode")]
    NoFinder,
}

pub type Result<T> = std::result::Result<T, QrError>;
