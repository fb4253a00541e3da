//! Recursive directory scanning.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// A regular file found by [`collect_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Location on disk
    pub disk_path: PathBuf,
    /// Name relative to the scanned root, `/`-separated
    pub stored_name: String,
}

/// Collect every regular file below `dir`, sorted by stored name.
///
/// Symlinks are not followed. Entries that cannot be read are skipped with
/// a warning, as are files whose relative path is not valid UTF-8.
pub fn collect_files<P: AsRef<Path>>(dir: P) -> Result<Vec<ScannedFile>> {
    let root = dir.as_ref();
    if !root.exists() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match stored_name(root, entry.path()) {
            Some(stored_name) => files.push(ScannedFile {
                disk_path: entry.into_path(),
                stored_name,
            }),
            None => warn!("Skipping {}: path is not valid UTF-8", entry.path().display()),
        }
    }

    if files.is_empty() {
        return Err(Error::NoFilesFound(root.to_path_buf()));
    }

    files.sort_by(|a, b| a.stored_name.cmp(&b.stored_name));
    debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}

/// Relative path of `path` below `root` with `/` separators.
fn stored_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;

    let mut out = String::new();
    for comp in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(comp.as_os_str().to_str()?);
    }

    (!out.is_empty()).then_some(out)
}
