//! Error types for foldcrc operations.
//!
//! Checksum updates themselves cannot fail. Errors only come from the
//! surfaces around the engine: reading input, parsing backend names and
//! checksum literals, and verifying a computed checksum.

use std::io;
use thiserror::Error;

/// The main error type for foldcrc operations.
#[derive(Debug, Error)]
pub enum FoldCrcError {
    /// I/O error from an underlying reader or file mapping.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A backend or force-mode name that is not recognised.
    #[error("Unknown backend: {name}")]
    UnknownBackend {
        /// The name that failed to parse.
        name: String,
    },

    /// A checksum literal that is not a 32-bit hexadecimal value.
    #[error("Invalid checksum literal: {literal}")]
    InvalidChecksum {
        /// The literal that failed to parse.
        literal: String,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Expected CRC value.
        expected: u32,
        /// Computed CRC value.
        computed: u32,
    },
}

/// Result type alias for foldcrc operations.
pub type Result<T> = std::result::Result<T, FoldCrcError>;

impl FoldCrcError {
    /// Create an unknown backend error.
    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::UnknownBackend { name: name.into() }
    }

    /// Create an invalid checksum literal error.
    pub fn invalid_checksum(literal: impl Into<String>) -> Self {
        Self::InvalidChecksum {
            literal: literal.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }
}

/// Parse a 32-bit checksum written as hexadecimal, with or without a `0x` prefix.
///
/// ```
/// use foldcrc_core::error::parse_checksum;
///
/// assert_eq!(parse_checksum("0xCBF43926").unwrap(), 0xCBF43926);
/// assert_eq!(parse_checksum("cbf43926").unwrap(), 0xCBF43926);
/// assert!(parse_checksum("not-hex").is_err());
/// ```
pub fn parse_checksum(literal: &str) -> Result<u32> {
    let trimmed = literal.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FoldCrcError::invalid_checksum(literal));
    }
    u32::from_str_radix(digits, 16).map_err(|_| FoldCrcError::invalid_checksum(literal))
}
