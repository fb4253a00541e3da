//! Error types for the MiniPack crate.

use std::path::PathBuf;

use minipack_common::EncodingError;
use thiserror::Error;

/// Errors that can occur when building or reading MiniPack archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry name is empty.
    #[error("entry name cannot be empty")]
    EmptyName,

    /// Entry name could not be encoded.
    #[error("cannot encode entry name {name:?}: {source}")]
    Encoding {
        name: String,
        source: EncodingError,
    },

    /// Encoded entry name exceeds the per-layout limit.
    #[error("entry name too long ({len} units, max {max}): {name}")]
    NameTooLong { name: String, len: usize, max: usize },

    /// Entry name contains a NUL, which the NUL-terminated layout cannot store.
    #[error("entry name contains a NUL byte: {0:?}")]
    NameContainsNul(String),

    /// A size, running total or block length does not fit in 32 bits.
    #[error("size overflow: {0}")]
    SizeOverflow(String),

    /// The builder has no entries.
    #[error("no entries added to MiniPack")]
    NoEntries,

    /// An entry writer produced a different byte count than declared.
    #[error("data size mismatch for entry {name}: declared {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// The output sink rejected a write.
    #[error("failed to write to pack output: {0}")]
    SinkWriteFailed(#[source] std::io::Error),

    /// An entry's data source failed while producing bytes.
    #[error("failed to produce data for entry {name}: {source}")]
    EntryWriteFailed {
        name: String,
        source: std::io::Error,
    },

    /// The pack file could not be opened.
    #[error("failed to open pack file {}: {source}", path.display())]
    FileOpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file does not start with the MiniPack magic.
    #[error("invalid pack magic: expected \"MINIPACK\", got {0:?}")]
    BadMagic([u8; 8]),

    /// The file ended inside the preamble or the info block.
    #[error("truncated pack header: needed {needed} bytes but only {available} available")]
    TruncatedHeader { needed: u64, available: u64 },

    /// The info block is structurally invalid.
    #[error("info block corrupted: {0}")]
    CorruptInfoBlock(#[from] CorruptReason),

    /// No entry with the requested name.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The data section ended before the entry's last byte.
    #[error("truncated data for entry {name}: expected {expected} bytes, got {actual}")]
    TruncatedData {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// Extracted bytes could not be written to the destination.
    #[error("failed to write extracted data: {0}")]
    OutputWriteFailed(#[source] std::io::Error),
}

/// Why an info block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptReason {
    /// A fixed header field is missing.
    #[error("missing {0} field")]
    MissingField(&'static str),

    /// Unsupported format version.
    #[error("unsupported version {0}")]
    BadVersion(u32),

    /// The declared file count cannot fit in the info block.
    #[error("file count {count} does not fit in {available} remaining bytes")]
    BadFileCount { count: u32, available: usize },

    /// The names block ended inside entry `index`.
    #[error("name block overrun at entry {index}")]
    NameBlockOverrun { index: usize },

    /// The size/offset table ended inside entry `index`.
    #[error("metadata overrun at entry {index}")]
    MetadataOverrun { index: usize },

    /// A stored name is not valid in its encoding.
    #[error("name of entry {index} is malformed: {source}")]
    NameDecode {
        index: usize,
        source: EncodingError,
    },

    /// A NUL-terminated name disagrees with its declared length.
    #[error("name of entry {index} has length {actual}, declared {declared}")]
    NameLengthMismatch {
        index: usize,
        declared: usize,
        actual: usize,
    },

    /// Unknown per-entry name encoding tag.
    #[error("unknown name encoding tag {tag} at entry {index}")]
    UnknownNameTag { index: usize, tag: u8 },

    /// An entry extends past the end of the data section.
    #[error("entry {index} (offset {offset}, size {size}) exceeds data size {total}")]
    EntryOutOfRange {
        index: usize,
        offset: u32,
        size: u32,
        total: u64,
    },

    /// An entry does not start where the previous one ends.
    #[error("entry {index} has offset {offset}, expected {expected}")]
    OffsetMismatch {
        index: usize,
        offset: u32,
        expected: u64,
    },

    /// Bytes left over after the size/offset table.
    #[error("{0} trailing bytes after metadata")]
    TrailingBytes(usize),
}

/// Result type for MiniPack operations.
pub type Result<T> = std::result::Result<T, Error>;
