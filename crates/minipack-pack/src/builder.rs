//! MiniPack archive builder.
//!
//! Entries are registered up front with a declared size, then written in
//! registration order by [`MiniPackBuilder::build_pack`]. Offsets are assigned
//! as the running sum of the sizes before each entry, so the header can be
//! emitted before any entry data is produced.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use minipack_common::{fill_buf, text};
use zerocopy::IntoBytes;

use crate::compat;
use crate::format::{NameLayout, PackPreamble, COPY_CHUNK_SIZE, FORMAT_VERSION};
use crate::names;
use crate::sink::PackSink;
use crate::{Error, Result};

/// Lazy entry data producer. Runs once during [`MiniPackBuilder::build_pack`].
pub type EntryWriteFn = Box<dyn FnOnce(&mut EntryWriter<'_>) -> io::Result<()>>;

/// A repeatable source of bytes with a known size.
pub trait ByteSource {
    /// Number of bytes [`ByteSource::open`] will yield.
    fn size(&self) -> io::Result<u64>;

    /// Open a fresh reader positioned at the first byte.
    fn open(&self) -> io::Result<Box<dyn Read>>;
}

/// Where an entry's bytes come from.
enum DataSource {
    Buffer(Vec<u8>),
    Writer(EntryWriteFn),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(data) => f.debug_tuple("Buffer").field(&data.len()).finish(),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

#[derive(Debug)]
struct PendingEntry {
    name: String,
    units: Vec<u16>,
    size: u32,
    source: DataSource,
}

/// Handle passed to lazy entry writers.
///
/// Forwards bytes to the pack sink while counting them. Writing more than the
/// entry's declared size fails immediately without forwarding the excess.
pub struct EntryWriter<'a> {
    sink: &'a mut dyn PackSink,
    expected: u64,
    written: u64,
    overrun: Option<u64>,
    sink_failed: bool,
}

impl<'a> EntryWriter<'a> {
    fn new(sink: &'a mut dyn PackSink, expected: u64) -> Self {
        Self {
            sink,
            expected,
            written: 0,
            overrun: None,
            sink_failed: false,
        }
    }

    /// Forward `bytes` to the pack.
    pub fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        let total = self.written + bytes.len() as u64;
        if total > self.expected {
            self.overrun = Some(total);
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entry data exceeds declared size of {} bytes", self.expected),
            ));
        }

        if let Err(e) = self.sink.write(bytes) {
            self.sink_failed = true;
            return Err(e);
        }

        self.written = total;
        Ok(())
    }

    /// Bytes forwarded so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Bytes still owed to reach the declared size.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.expected - self.written
    }

    /// Turn the writer's outcome into a build result.
    fn finish(self, name: &str, result: io::Result<()>) -> Result<u64> {
        if let Some(actual) = self.overrun {
            return Err(Error::SizeMismatch {
                name: name.to_string(),
                expected: self.expected,
                actual,
            });
        }

        if self.sink_failed {
            let source =
                result.err().unwrap_or_else(|| io::Error::other("pack output rejected a write"));
            return Err(Error::SinkWriteFailed(source));
        }

        if let Err(source) = result {
            return Err(Error::EntryWriteFailed {
                name: name.to_string(),
                source,
            });
        }

        if self.written != self.expected {
            return Err(Error::SizeMismatch {
                name: name.to_string(),
                expected: self.expected,
                actual: self.written,
            });
        }

        Ok(self.written)
    }
}

impl Write for EntryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Totals reported after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Length of the info block in bytes
    pub info_size: u32,
    /// Sum of all entry sizes
    pub total_data_size: u64,
    /// Number of entries
    pub file_count: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files (info_size={}, data={} bytes)",
            self.file_count, self.info_size, self.total_data_size
        )
    }
}

/// Serialized header plus the offsets assigned to each entry.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    /// Preamble followed by the info block
    pub header: Vec<u8>,
    /// Data offset of each entry, in registration order
    pub offsets: Vec<u32>,
    /// Totals for the build
    pub summary: BuildSummary,
}

/// Collects entries and writes them out as a MiniPack archive.
///
/// # Example
///
/// ```
/// use minipack_pack::MiniPackBuilder;
///
/// let mut builder = MiniPackBuilder::new();
/// builder.add_entry_from_buffer("a.txt", b"hello".to_vec())?;
/// builder.add_entry("b.bin", 3, |w| w.write_chunk(b"xyz"))?;
///
/// let mut out: Vec<u8> = Vec::new();
/// let summary = builder.build_pack(&mut out, false)?;
/// assert_eq!(summary.file_count, 2);
/// # Ok::<(), minipack_pack::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MiniPackBuilder {
    entries: Vec<PendingEntry>,
    layout: NameLayout,
}

impl MiniPackBuilder {
    /// Create an empty builder writing the canonical name layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write names in `layout` instead of the canonical one.
    ///
    /// Only useful for producing archives readable by older tools.
    pub fn with_name_layout(mut self, layout: NameLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Name layout the builder will write.
    #[inline]
    pub fn name_layout(&self) -> NameLayout {
        self.layout
    }

    /// Drop all registered entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether no entries are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered entries.
    #[inline]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Registered names and declared sizes, in order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|e| (e.name.as_str(), e.size))
    }

    /// Register an entry whose bytes are held in memory.
    pub fn add_entry_from_buffer(
        &mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let name = name.into();
        let data = data.into();

        let size = u32::try_from(data.len()).map_err(|_| {
            Error::SizeOverflow(format!("entry {name} is {} bytes", data.len()))
        })?;

        self.push(name, size, DataSource::Buffer(data))
    }

    /// Register an entry of `size` bytes produced by `writer` during the build.
    ///
    /// The writer must emit exactly `size` bytes through the [`EntryWriter`].
    pub fn add_entry<F>(&mut self, name: impl Into<String>, size: u32, writer: F) -> Result<()>
    where
        F: FnOnce(&mut EntryWriter<'_>) -> io::Result<()> + 'static,
    {
        self.push(name.into(), size, DataSource::Writer(Box::new(writer)))
    }

    /// Register an entry backed by a [`ByteSource`], copied in chunks.
    pub fn add_entry_from_source<S>(&mut self, name: impl Into<String>, source: S) -> Result<()>
    where
        S: ByteSource + 'static,
    {
        let name = name.into();
        let len = source.size().map_err(|source| Error::EntryWriteFailed {
            name: name.clone(),
            source,
        })?;
        let size = u32::try_from(len)
            .map_err(|_| Error::SizeOverflow(format!("entry {name} is {len} bytes")))?;

        self.add_entry(name, size, move |writer| {
            let mut input = source.open()?;
            let mut buf = vec![0u8; COPY_CHUNK_SIZE];
            loop {
                let (eof, filled) = fill_buf(&mut input, &mut buf)?;
                writer.write_chunk(&buf[..filled])?;
                if eof {
                    return Ok(());
                }
            }
        })
    }

    fn push(&mut self, name: String, size: u32, source: DataSource) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let units = text::utf8_to_utf16(name.as_bytes()).map_err(|source| Error::Encoding {
            name: name.clone(),
            source,
        })?;

        self.entries.push(PendingEntry {
            name,
            units,
            size,
            source,
        });
        Ok(())
    }

    /// Serialize the preamble and info block and assign entry offsets.
    pub fn build_index(&self) -> Result<BuiltIndex> {
        if self.entries.is_empty() {
            return Err(Error::NoEntries);
        }

        let file_count = u32::try_from(self.entries.len())
            .map_err(|_| Error::SizeOverflow(format!("{} entries", self.entries.len())))?;

        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut total: u64 = 0;
        for entry in &self.entries {
            let offset = u32::try_from(total).map_err(|_| {
                Error::SizeOverflow(format!("data offset of {} is {total}", entry.name))
            })?;
            offsets.push(offset);
            total += entry.size as u64;
        }
        if total > u32::MAX as u64 {
            return Err(Error::SizeOverflow(format!("total data size is {total} bytes")));
        }

        let mut info: Vec<u8> = Vec::new();
        info.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        info.write_u32::<LittleEndian>(file_count)?;

        match self.layout {
            NameLayout::Utf16 => {
                for entry in &self.entries {
                    names::write_utf16_name(&mut info, &entry.name, &entry.units)?;
                }
            }
            layout => {
                let names = self.entries.iter().map(|e| e.name.as_str());
                compat::encode_names(layout, names, &mut info)?;
            }
        }

        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            info.write_u32::<LittleEndian>(entry.size)?;
            info.write_u32::<LittleEndian>(offset)?;
        }

        let info_size = u32::try_from(info.len())
            .map_err(|_| Error::SizeOverflow(format!("info block is {} bytes", info.len())))?;

        let mut header = Vec::with_capacity(PackPreamble::SIZE + info.len());
        header.extend_from_slice(PackPreamble::new(info_size).as_bytes());
        header.extend_from_slice(&info);

        Ok(BuiltIndex {
            header,
            offsets,
            summary: BuildSummary {
                info_size,
                total_data_size: total,
                file_count: self.entries.len(),
            },
        })
    }

    /// Write the archive to `sink`.
    ///
    /// With `index_only` only the preamble and info block are written and no
    /// entry writer runs. Otherwise entry data follows in registration order;
    /// the first failing entry stops the build and nothing after it is written.
    pub fn build_pack(self, sink: &mut dyn PackSink, index_only: bool) -> Result<BuildSummary> {
        let index = self.build_index()?;
        debug!(
            "Writing MiniPack header: {} entries, info_size={}",
            index.summary.file_count, index.summary.info_size
        );

        sink.write(&index.header).map_err(Error::SinkWriteFailed)?;

        if index_only {
            return Ok(index.summary);
        }

        for entry in self.entries {
            match entry.source {
                DataSource::Buffer(data) => {
                    sink.write(&data).map_err(Error::SinkWriteFailed)?;
                }
                DataSource::Writer(write) => {
                    let mut writer = EntryWriter::new(sink, entry.size as u64);
                    let result = write(&mut writer);
                    writer.finish(&entry.name, result)?;
                }
            }
            debug!("Wrote entry {} ({} bytes)", entry.name, entry.size);
        }

        Ok(index.summary)
    }
}
