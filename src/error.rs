//! Error types for the Scatha annotation engine.
//!
//! Faults raised while walking a binary are represented by `DecodeFault`;
//! file-granularity entry points wrap them together with I/O failures in
//! `ScathaError`.

use thiserror::Error;

/// A fault raised while detecting or walking a binary image.
///
/// Walkers are not validators: they fault only when structure prevents
/// further progress or a read would cross the file extent. Conditions that
/// merely affect a label degrade in place and never surface here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeFault {
    /// No registered format probe claimed the input.
    #[error("no registered format matches the input")]
    NoMatchingFormat,

    /// A read or seek would cross the end of the image.
    #[error("read of {needed} bytes at offset {offset:#x} crosses the image end ({size:#x} bytes)")]
    OutOfBounds { offset: u64, needed: u64, size: u64 },

    /// A string scan hit the end of its window without finding a NUL.
    #[error("unterminated string at offset {offset:#x}")]
    UnterminatedString { offset: u64 },

    /// A declared size or format-defining constant disagrees with the
    /// format's architecture. Soft for ELF `e_ehsize` (logged, walk
    /// continues); fatal for DEX and Mach-O structure fields.
    #[error("{field}: expected {expected:#x}, found {found:#x}")]
    HeaderSizeMismatch {
        field: &'static str,
        expected: u64,
        found: u64,
    },

    /// An OpenPGP packet tag byte without the mandatory marker bit.
    #[error("packet tag byte {tag:#04x} at offset {offset:#x} lacks the marker bit")]
    InvalidPacketTag { tag: u8, offset: u64 },

    /// A value outside a known enumeration where a resolver could not
    /// produce a name. Callers catch this and degrade the label; it never
    /// escapes `tag_format`.
    #[error("value {value:#x} for {field} is outside the known range")]
    UnsupportedValue { field: &'static str, value: u64 },
}

/// Result type alias for walk-level operations.
pub type Result<T> = std::result::Result<T, DecodeFault>;

/// Top-level error for file-granularity operations.
#[derive(Debug, Error)]
pub enum ScathaError {
    /// Detection or walking failed.
    #[error(transparent)]
    Decode(#[from] DecodeFault),

    /// Reading the file failed or exceeded the configured limits.
    #[error(transparent)]
    Io(#[from] crate::io::IoError),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(String),
}
