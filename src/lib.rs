//! Encoding, decoding and image-based detection of QR-family symbols
//! (classic QR 1-40, micro QR M1-M4, rectangular micro QR, the fixed
//! 19x19 tQR variant) and the common 1-D barcodes (EAN-13/8, UPC-A,
//! Code 39, Code 93, ITF, NW-7).
//!
//! Everything routes through one abstraction: a position iterator mapping
//! a logical bit index to a planar pixel position plus polarity. Finder
//! patterns, timing lines, format info, the interleaved codeword stream
//! and the zig-zag data walk are all just different iterators over the
//! same canvas.
//!
//! ```no_run
//! use qrloom::{CodeType, DataType, Symbol};
//!
//! let mut sym = Symbol::new(CodeType::Qr);
//! sym.write_string("Hello, world", DataType::Auto).unwrap();
//! let img = sym.to_image();
//!
//! for hit in qrloom::detect(&img) {
//!     println!("{}: {}", hit.kind.name(), hit.text);
//! }
//! ```

pub use config::{CodeType, DataType, EccLevel, EciCode, MaskPattern, SymbolConfig, Version};
pub use detector::{detect, detect_with_gamma, Detection};
pub use error::QrError;
pub use symbol::{QrPattern, Symbol};

pub mod bitcoding;
pub mod bitstream;
pub mod canvas;
pub mod config;
pub mod detector;
pub mod error;
pub mod formatinfo;
pub mod galois;
pub mod kanji;
pub mod masking;
pub mod payload;
pub mod rscoding;
pub mod runlength;
pub mod symbol;
pub mod tables;

mod code_code39;
mod code_code93;
mod code_ean;
mod code_itf;
mod code_mqr;
mod code_nw7;
mod code_qr;
mod code_rmqr;
mod code_tqr;

/// Render `content` as a QR symbol with a four-module quiet zone.
pub fn create_qr_code(content: &str, version: Option<Version>, level: EccLevel) -> Result<image::GrayImage, QrError> {
    let mut sym = Symbol::new(CodeType::Qr);
    if let Some(v) = version {
        sym.set_version(v)?;
    }
    sym.set_level(level);
    sym.write_string(content, DataType::Auto)?;
    sym.canvas.bitmap_padding = canvas::Padding::uniform(4);
    Ok(sym.to_image())
}
