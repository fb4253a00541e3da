//! Error types for filesystem inputs.

use std::path::PathBuf;

use minipack_common::EncodingError;
use thiserror::Error;

/// Errors raised while gathering files to pack.
#[derive(Debug, Error)]
pub enum Error {
    /// Pack builder error.
    #[error("{0}")]
    Pack(#[from] minipack_pack::Error),

    /// The input directory does not exist.
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The input path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A directory scan found no regular files.
    #[error("no files found in directory: {}", .0.display())]
    NoFilesFound(PathBuf),

    /// A list file could not be read.
    #[error("failed to read list file {}: {source}", path.display())]
    ListReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A list file is not valid text in its detected encoding.
    #[error("failed to decode list file {}: {source}", path.display())]
    ListDecodeFailed {
        path: PathBuf,
        source: EncodingError,
    },

    /// A list file names no files.
    #[error("no files listed in {}", .0.display())]
    EmptyFileList(PathBuf),

    /// A path cannot be used as a stored name.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// Result type for filesystem input operations.
pub type Result<T> = std::result::Result<T, Error>;
