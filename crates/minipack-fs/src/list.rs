//! Plain-text file lists.
//!
//! One path per line. Blank lines and lines starting with `#` are ignored,
//! surrounding whitespace is trimmed, and a byte order mark is stripped
//! wherever it appears at the start of a line.

use std::fs;
use std::path::Path;

use log::debug;
use minipack_common::text::decode_text;

use crate::{Error, Result};

const BOM: char = '\u{FEFF}';

/// Read the paths listed in the text file at `path`.
pub fn read_file_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::ListReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(&bytes).map_err(|source| Error::ListDecodeFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let files = parse_file_list(&text);
    if files.is_empty() {
        return Err(Error::EmptyFileList(path.to_path_buf()));
    }

    debug!("Read {} paths from {}", files.len(), path.display());
    Ok(files)
}

/// Extract listed paths from already decoded text.
pub fn parse_file_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_start_matches(BOM).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
