//! Error types for minipack-common.

use thiserror::Error;

/// Common error type for MiniPack operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

/// A malformed byte or code unit sequence.
///
/// Offsets are in the atomic unit of the source encoding: bytes for UTF-8 and
/// UTF-32 input, code units for UTF-16 input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Invalid UTF-8 (overlong form, bad continuation byte, encoded
    /// surrogate or a code point above U+10FFFF).
    #[error("invalid UTF-8 sequence at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// UTF-8 input ended in the middle of a multi-byte sequence.
    #[error("truncated UTF-8 sequence at byte {offset}")]
    TruncatedUtf8 { offset: usize },

    /// High surrogate not followed by a low surrogate.
    #[error("unpaired high surrogate {unit:#06x} at unit {offset}")]
    UnpairedHighSurrogate { unit: u16, offset: usize },

    /// Low surrogate without a preceding high surrogate.
    #[error("unpaired low surrogate {unit:#06x} at unit {offset}")]
    UnpairedLowSurrogate { unit: u16, offset: usize },

    /// UTF-16 or UTF-32 byte input whose length is not a multiple of the unit size.
    #[error("input length {len} is not a multiple of {unit} bytes")]
    OddLength { len: usize, unit: usize },

    /// UTF-32 value that is not a Unicode scalar value.
    #[error("invalid code point {value:#x} at byte {offset}")]
    InvalidCodePoint { value: u32, offset: usize },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
