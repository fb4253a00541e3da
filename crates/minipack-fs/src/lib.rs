//! Filesystem inputs for building MiniPack archives.
//!
//! - [`scan`] - Recursive directory scanning into `(disk path, stored name)` pairs
//! - [`list`] - BOM-aware reading of text file lists
//! - [`source`] - Files on disk as lazily copied pack entries

mod error;

pub mod list;
pub mod scan;
pub mod source;

pub use error::{Error, Result};
pub use list::read_file_list;
pub use scan::{collect_files, ScannedFile};
pub use source::{add_file_to_builder, FileSource};
