//! Files on disk as pack entries.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use minipack_pack::{ByteSource, MiniPackBuilder};

use crate::{Error, Result};

/// A [`ByteSource`] reading a file on disk.
///
/// The size comes from the file's metadata when the entry is registered and
/// the file is opened again when the pack is written.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Register the file at `path` with `builder`.
///
/// The entry is stored as `stored_name`, or as the path itself when no name
/// is given.
pub fn add_file_to_builder<P: AsRef<Path>>(
    builder: &mut MiniPackBuilder,
    path: P,
    stored_name: Option<&str>,
) -> Result<()> {
    let path = path.as_ref();
    let name = match stored_name {
        Some(name) => name.to_string(),
        None => path
            .to_str()
            .ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?
            .to_string(),
    };

    builder.add_entry_from_source(name, FileSource::new(path))?;
    Ok(())
}
