//! MiniPack archive builder and reader.
//!
//! A MiniPack is a flat archive: a 12-byte preamble, an info block indexing
//! every entry by name, size and offset, then the concatenated entry data.
//! There is no compression and no directory structure beyond the names.
//!
//! # Example
//!
//! ```no_run
//! use minipack_pack::{FileSink, MiniPackBuilder, MiniPackReader};
//!
//! let mut builder = MiniPackBuilder::new();
//! builder.add_entry_from_buffer("a.txt", b"hello".to_vec())?;
//!
//! let mut sink = FileSink::create("out.pack")?;
//! builder.build_pack(&mut sink, false)?;
//! sink.finish()?;
//!
//! let reader = MiniPackReader::open("out.pack")?;
//! assert_eq!(reader.read_entry_data("a.txt")?, b"hello");
//! # Ok::<(), minipack_pack::Error>(())
//! ```

mod builder;
mod entry;
mod error;
mod index;
mod names;
mod reader;
mod sink;

pub mod compat;
pub mod format;

pub use builder::{BuildSummary, BuiltIndex, ByteSource, EntryWriteFn, EntryWriter, MiniPackBuilder};
pub use entry::MiniPackEntry;
pub use error::{CorruptReason, Error, Result};
pub use format::{NameLayout, PackPreamble, MAGIC};
pub use index::MiniPackIndex;
pub use reader::MiniPackReader;
pub use sink::{FileSink, PackSink, WriterSink};
