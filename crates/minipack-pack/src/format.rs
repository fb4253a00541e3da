//! On-disk layout constants and the fixed pack preamble.
//!
//! ```text
//! magic[8]            "MINIPACK"
//! info_size: u32      length of the info block
//! info block:
//!   version: u32      FORMAT_VERSION
//!   file_count: u32
//!   names block       (see NameLayout)
//!   file_count x { size: u32, offset: u32 }
//! data section        entry bytes, back to back
//! ```
//!
//! All integers are little-endian. Offsets are relative to the start of the
//! data section.

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Pack file magic.
pub const MAGIC: &[u8; 8] = b"MINIPACK";

/// The only info block version this crate reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// Longest stored name in any layout, counted in the layout's own units.
pub const MAX_NAME_LEN: usize = 255;

/// Size of one `{ size, offset }` metadata record.
pub const ENTRY_META_SIZE: usize = 8;

/// Chunk size for streamed copies in and out of a pack.
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Fixed 12-byte start of every pack file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct PackPreamble {
    /// Must equal [`MAGIC`]
    pub magic: [u8; 8],
    /// Byte length of the info block that follows
    pub info_size: U32,
}

impl PackPreamble {
    /// Size of the preamble in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a preamble for an info block of `info_size` bytes.
    pub fn new(info_size: u32) -> Self {
        Self {
            magic: *MAGIC,
            info_size: U32::new(info_size),
        }
    }

    /// Check the magic bytes.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        &self.magic == MAGIC
    }

    /// Absolute offset of the data section.
    #[inline]
    pub fn data_start(&self) -> u64 {
        Self::SIZE as u64 + self.info_size.get() as u64
    }
}

/// How entry names are laid out in the info block.
///
/// [`NameLayout::Utf16`] is the canonical layout written by current tools.
/// The others describe archives produced by older tools and are only read
/// when a caller asks for them explicitly; see [`crate::compat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NameLayout {
    /// Per entry: `[u8 unit_count][unit_count x u16 LE]`.
    #[default]
    Utf16,
    /// `file_count` one-byte lengths, then `file_count` NUL-terminated UTF-8 names.
    FlatUtf8,
    /// Per entry: `[u8 tag][u8 len][...]`, tag 0 = UTF-8 bytes, tag 1 = UTF-16LE units.
    Tagged,
}

impl NameLayout {
    /// Fewest bytes one entry occupies in the names block.
    pub const fn min_name_bytes(self) -> usize {
        match self {
            Self::Utf16 => 1,
            Self::FlatUtf8 | Self::Tagged => 2,
        }
    }
}
