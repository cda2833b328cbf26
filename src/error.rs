//! Error types for line-program decoding and mapping queries.

use thiserror::Error;

/// Errors produced while decoding a line-number program or resolving a
/// translation unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Line-number program encoded with a version we do not interpret.
    #[error("line number program with version {version} is not supported")]
    UnsupportedVersion { version: u16 },

    /// Header declares a line range of zero, which every address/line
    /// advance divides by.
    #[error("line number program at offset {offset:#x} has a zero line range")]
    ZeroLineRange { offset: u64 },

    /// Truncated or otherwise undecodable header or opcode bytes.
    #[error("malformed line number program: {0}")]
    Malformed(#[from] gimli::Error),

    /// Program offset lies past the end of `.debug_line`.
    #[error("line program offset {offset:#x} is outside .debug_line ({size} bytes)")]
    OffsetOutOfRange { offset: u64, size: usize },

    /// Translation unit does not carry a DWARF line program.
    #[error("translation unit {unit} does not expose a DWARF line program")]
    TypeMismatch { unit: String },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
