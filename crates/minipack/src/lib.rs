//! MiniPack - flat archive library.
//!
//! This crate provides a unified interface to the MiniPack crates.
//!
//! # Crates
//!
//! - [`minipack_common`] - Binary reading and text/name encoding
//! - [`minipack_pack`] - Archive builder, index loader and reader
//! - [`minipack_fs`] - Directory scanning, file lists and on-disk sources
//!
//! # Example
//!
//! ```no_run
//! use minipack::prelude::*;
//!
//! let mut builder = MiniPackBuilder::new();
//! for file in collect_files("assets")? {
//!     add_file_to_builder(&mut builder, &file.disk_path, Some(&file.stored_name))?;
//! }
//!
//! let mut sink = FileSink::create("assets.pack")?;
//! let summary = builder.build_pack(&mut sink, false)?;
//! sink.finish()?;
//! println!("Packed {summary}");
//!
//! let reader = MiniPackReader::open("assets.pack")?;
//! for entry in reader.entries() {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use minipack_common as common;
pub use minipack_fs as fs;
pub use minipack_pack as pack;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use minipack_common::text::decode_text;
    pub use minipack_fs::{add_file_to_builder, collect_files, read_file_list, FileSource};
    pub use minipack_pack::{
        BuildSummary, ByteSource, FileSink, MiniPackBuilder, MiniPackEntry, MiniPackReader,
        NameLayout, PackSink,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
