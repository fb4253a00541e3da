//! Pack index loading.
//!
//! Reads the preamble and info block of a pack and validates every entry
//! against the declared data size before anything is extracted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use minipack_common::{fill_buf, BinaryReader};
use zerocopy::FromBytes;

use crate::compat;
use crate::entry::MiniPackEntry;
use crate::format::{NameLayout, PackPreamble, ENTRY_META_SIZE, FORMAT_VERSION};
use crate::{CorruptReason, Error, Result};

/// Parsed pack header.
#[derive(Debug, Clone)]
pub struct MiniPackIndex {
    entries: Vec<MiniPackEntry>,
    version: u32,
    info_size: u32,
    layout: NameLayout,
}

impl MiniPackIndex {
    /// Load the index of the pack at `path`.
    pub fn load<P: AsRef<Path>>(path: P, layout: NameLayout) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_from(BufReader::new(file), layout)
    }

    /// Read an index from the start of `reader`.
    ///
    /// Only the preamble and info block are consumed.
    pub fn read_from<R: Read>(mut reader: R, layout: NameLayout) -> Result<Self> {
        let mut raw = [0u8; PackPreamble::SIZE];
        let (_, filled) = fill_buf(&mut reader, &mut raw)?;
        let truncated = |available: usize| Error::TruncatedHeader {
            needed: PackPreamble::SIZE as u64,
            available: available as u64,
        };
        if filled < PackPreamble::SIZE {
            return Err(truncated(filled));
        }

        let preamble = PackPreamble::read_from_bytes(&raw).map_err(|_| truncated(filled))?;
        if !preamble.has_valid_magic() {
            return Err(Error::BadMagic(preamble.magic));
        }

        let info_size = preamble.info_size.get();
        let mut info: Vec<u8> = Vec::new();
        reader
            .by_ref()
            .take(info_size as u64)
            .read_to_end(&mut info)?;
        if info.len() < info_size as usize {
            return Err(Error::TruncatedHeader {
                needed: preamble.data_start(),
                available: (PackPreamble::SIZE + info.len()) as u64,
            });
        }

        let (version, entries) = parse_info(&info, layout)?;
        debug!(
            "Loaded MiniPack index: {} entries, info_size={}",
            entries.len(),
            info_size
        );

        Ok(Self {
            entries,
            version,
            info_size,
            layout,
        })
    }

    /// Entries in stored order.
    #[inline]
    pub fn entries(&self) -> &[MiniPackEntry] {
        &self.entries
    }

    /// Number of entries.
    #[inline]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Format version from the info block.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Length of the info block.
    #[inline]
    pub fn info_size(&self) -> u32 {
        self.info_size
    }

    /// Absolute file offset of the data section.
    #[inline]
    pub fn data_start(&self) -> u64 {
        PackPreamble::SIZE as u64 + self.info_size as u64
    }

    /// Name layout the index was parsed with.
    #[inline]
    pub fn layout(&self) -> NameLayout {
        self.layout
    }

    /// Sum of all entry sizes.
    pub fn total_data_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size as u64).sum()
    }

    /// First entry whose name equals `name` exactly.
    pub fn find(&self, name: &str) -> Option<&MiniPackEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

fn parse_info(
    info: &[u8],
    layout: NameLayout,
) -> std::result::Result<(u32, Vec<MiniPackEntry>), CorruptReason> {
    let mut reader = BinaryReader::new(info);

    let version = reader
        .read_u32()
        .map_err(|_| CorruptReason::MissingField("version"))?;
    if version != FORMAT_VERSION {
        return Err(CorruptReason::BadVersion(version));
    }

    let count = reader
        .read_u32()
        .map_err(|_| CorruptReason::MissingField("file_count"))?;

    // Reject counts that cannot fit before allocating anything for them
    let available = reader.remaining();
    let min_entry = (layout.min_name_bytes() + ENTRY_META_SIZE) as u64;
    if count as u64 * min_entry > available as u64 {
        return Err(CorruptReason::BadFileCount { count, available });
    }
    let count = count as usize;

    let names = compat::decode_names(layout, &mut reader, count)?;

    let mut entries = Vec::with_capacity(count);
    for (index, name) in names.into_iter().enumerate() {
        let overrun = |_| CorruptReason::MetadataOverrun { index };
        let size = reader.read_u32().map_err(overrun)?;
        let offset = reader.read_u32().map_err(overrun)?;
        entries.push(MiniPackEntry { name, size, offset });
    }

    if !reader.is_empty() {
        return Err(CorruptReason::TrailingBytes(reader.remaining()));
    }

    let total: u64 = entries.iter().map(|e| e.size as u64).sum();
    let mut expected: u64 = 0;
    for (index, entry) in entries.iter().enumerate() {
        if entry.end() > total {
            return Err(CorruptReason::EntryOutOfRange {
                index,
                offset: entry.offset,
                size: entry.size,
                total,
            });
        }
        // Entries are packed back to back in stored order
        if entry.offset as u64 != expected {
            return Err(CorruptReason::OffsetMismatch {
                index,
                offset: entry.offset,
                expected,
            });
        }
        expected += entry.size as u64;
    }

    Ok((version, entries))
}
