//! MiniPack archive reader.
//!
//! The reader keeps only the parsed index in memory. Every data read opens
//! the pack file again, so a reader can be shared across threads freely.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::debug;
use minipack_common::fill_buf;

use crate::entry::MiniPackEntry;
use crate::format::{NameLayout, COPY_CHUNK_SIZE};
use crate::index::MiniPackIndex;
use crate::sink::{FileSink, PackSink};
use crate::{Error, Result};

/// An opened MiniPack archive.
#[derive(Debug, Clone)]
pub struct MiniPackReader {
    path: PathBuf,
    index: MiniPackIndex,
}

impl MiniPackReader {
    /// Open the pack at `path` using the canonical name layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_layout(path, NameLayout::Utf16)
    }

    /// Open a pack whose names are stored in `layout`.
    pub fn open_with_layout<P: AsRef<Path>>(path: P, layout: NameLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index = MiniPackIndex::load(&path, layout)?;
        debug!("Opened {} ({} entries)", path.display(), index.file_count());
        Ok(Self { path, index })
    }

    /// Path of the pack file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed index.
    #[inline]
    pub fn index(&self) -> &MiniPackIndex {
        &self.index
    }

    /// Entries in stored order.
    #[inline]
    pub fn entries(&self) -> &[MiniPackEntry] {
        self.index.entries()
    }

    /// First entry named `name`.
    #[inline]
    pub fn find(&self, name: &str) -> Option<&MiniPackEntry> {
        self.index.find(name)
    }

    fn lookup(&self, name: &str) -> Result<&MiniPackEntry> {
        self.find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))
    }

    /// Open the pack file positioned at the first byte of `entry`.
    fn open_entry(&self, entry: &MiniPackEntry) -> Result<File> {
        let mut file = File::open(&self.path).map_err(|source| Error::FileOpenFailed {
            path: self.path.clone(),
            source,
        })?;
        file.seek(SeekFrom::Start(self.index.data_start() + entry.offset as u64))?;
        Ok(file)
    }

    /// Read the bytes of `entry`.
    pub fn read_entry(&self, entry: &MiniPackEntry) -> Result<Vec<u8>> {
        let file = self.open_entry(entry)?;

        // Sizes come from the header, so grow with the bytes actually read
        let mut data = Vec::with_capacity(COPY_CHUNK_SIZE.min(entry.size as usize));
        file.take(entry.size as u64).read_to_end(&mut data)?;

        if data.len() < entry.size as usize {
            return Err(Error::TruncatedData {
                name: entry.name.clone(),
                expected: entry.size as u64,
                actual: data.len() as u64,
            });
        }
        Ok(data)
    }

    /// Read the bytes of the first entry named `name`.
    pub fn read_entry_data(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.lookup(name)?;
        self.read_entry(entry)
    }

    /// Stream the first entry named `name` into `sink`, returning the byte count.
    pub fn read_entry_to_stream(&self, name: &str, sink: &mut dyn PackSink) -> Result<u64> {
        let entry = self.lookup(name)?;
        self.copy_entry(entry, sink)
    }

    /// Stream `entry` into `sink` in fixed-size chunks.
    pub fn copy_entry(&self, entry: &MiniPackEntry, sink: &mut dyn PackSink) -> Result<u64> {
        let mut input = self.open_entry(entry)?.take(entry.size as u64);
        let mut buf = vec![0u8; COPY_CHUNK_SIZE.min(entry.size as usize)];
        let mut copied: u64 = 0;

        while copied < entry.size as u64 {
            let (eof, filled) = fill_buf(&mut input, &mut buf)?;
            sink.write(&buf[..filled]).map_err(Error::OutputWriteFailed)?;
            copied += filled as u64;
            if eof {
                break;
            }
        }

        if copied < entry.size as u64 {
            return Err(Error::TruncatedData {
                name: entry.name.clone(),
                expected: entry.size as u64,
                actual: copied,
            });
        }
        Ok(copied)
    }

    /// Extract the first entry named `name` to a new file at `out_path`.
    pub fn extract_entry_to_file<P: AsRef<Path>>(&self, name: &str, out_path: P) -> Result<u64> {
        let entry = self.lookup(name)?;
        self.extract_to_file(entry, out_path.as_ref())
    }

    /// Extract `entry` to a new file at `out_path`.
    pub fn extract_to_file(&self, entry: &MiniPackEntry, out_path: &Path) -> Result<u64> {
        let mut sink = FileSink::create(out_path).map_err(Error::OutputWriteFailed)?;
        let copied = self.copy_entry(entry, &mut sink)?;
        sink.finish().map_err(Error::OutputWriteFailed)?;

        debug!("Extracted {} to {}", entry.name, out_path.display());
        Ok(copied)
    }

    /// Read several entries at once, each on its own file handle.
    ///
    /// Results are returned in the order of `entries`.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, entries: &[MiniPackEntry]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        entries.par_iter().map(|e| self.read_entry(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MiniPackBuilder;
    use crate::CorruptReason;
    use std::io;
    use tempfile::TempDir;

    fn write_pack(dir: &TempDir, builder: MiniPackBuilder) -> PathBuf {
        let path = dir.path().join("test.pack");
        let mut sink = FileSink::create(&path).unwrap();
        builder.build_pack(&mut sink, false).unwrap();
        sink.finish().unwrap();
        path
    }

    fn sample_builder() -> MiniPackBuilder {
        let mut builder = MiniPackBuilder::new();
        builder.add_entry_from_buffer("a.txt", b"hello".to_vec()).unwrap();
        builder.add_entry_from_buffer("b.bin", Vec::new()).unwrap();
        builder
    }

    #[test]
    fn test_two_entry_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..8], b"MINIPACK");

        let reader = MiniPackReader::open(&path).unwrap();
        assert_eq!(reader.entries().len(), 2);
        assert_eq!(reader.read_entry_data("b.bin").unwrap(), Vec::<u8>::new());
        assert_eq!(reader.read_entry_data("a.txt").unwrap(), b"hello");
    }

    #[test]
    fn test_round_trip() {
        let files: Vec<(String, Vec<u8>)> = vec![
            ("readme.md".into(), b"# title\n".to_vec()),
            ("data/blob.bin".into(), (0..=255u8).cycle().take(200_000).collect()),
            ("empty".into(), Vec::new()),
            ("ünïcode/😀.txt".into(), "smile".as_bytes().to_vec()),
        ];

        let mut builder = MiniPackBuilder::new();
        for (name, data) in &files {
            builder.add_entry_from_buffer(name.as_str(), data.clone()).unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, builder);
        let reader = MiniPackReader::open(&path).unwrap();

        let mut expected_offset = 0u32;
        for ((name, data), entry) in files.iter().zip(reader.entries()) {
            assert_eq!(&entry.name, name);
            assert_eq!(entry.size as usize, data.len());
            assert_eq!(entry.offset, expected_offset);
            expected_offset += entry.size;

            assert_eq!(&reader.read_entry_data(name).unwrap(), data);
        }
    }

    #[test]
    fn test_lazy_writer_round_trip() {
        let mut builder = MiniPackBuilder::new();
        builder
            .add_entry("generated", 6, |w| {
                w.write_chunk(b"abc")?;
                w.write_chunk(b"def")
            })
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, builder);
        let reader = MiniPackReader::open(&path).unwrap();
        assert_eq!(reader.read_entry_data("generated").unwrap(), b"abcdef");
    }

    #[test]
    fn test_entry_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());
        let reader = MiniPackReader::open(&path).unwrap();

        assert!(matches!(
            reader.read_entry_data("A.TXT"),
            Err(Error::EntryNotFound(name)) if name == "A.TXT"
        ));
        assert!(matches!(
            reader.read_entry_data("./a.txt"),
            Err(Error::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_truncated_data_at_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());

        // Drop the last two bytes of "hello"
        let raw = std::fs::read(&path).unwrap();
        std::fs::write(&path, &raw[..raw.len() - 2]).unwrap();

        let reader = MiniPackReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_entry_data("a.txt"),
            Err(Error::TruncatedData {
                expected: 5,
                actual: 3,
                ..
            })
        ));

        let mut out: Vec<u8> = Vec::new();
        assert!(matches!(
            reader.read_entry_to_stream("a.txt", &mut out),
            Err(Error::TruncatedData { .. })
        ));

        // The index stays usable after a failed extraction
        assert_eq!(reader.read_entry_data("b.bin").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_huge_declared_size_on_tiny_file() {
        let mut info = 1u32.to_le_bytes().to_vec();
        info.extend_from_slice(&1u32.to_le_bytes());
        info.extend_from_slice(&[1, b'a', 0]);
        info.extend_from_slice(&u32::MAX.to_le_bytes());
        info.extend_from_slice(&0u32.to_le_bytes());

        let mut raw = crate::format::MAGIC.to_vec();
        raw.extend_from_slice(&(info.len() as u32).to_le_bytes());
        raw.extend_from_slice(&info);
        raw.extend_from_slice(b"ab");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pack");
        std::fs::write(&path, &raw).unwrap();
        assert_eq!(raw.len(), 33);

        let reader = MiniPackReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_entry_data("a"),
            Err(Error::TruncatedData {
                expected: 4_294_967_295,
                actual: 2,
                ..
            })
        ));

        let mut out: Vec<u8> = Vec::new();
        assert!(matches!(
            reader.read_entry_to_stream("a", &mut out),
            Err(Error::TruncatedData { actual: 2, .. })
        ));
        assert_eq!(out, b"ab");
    }

    #[test]
    fn test_out_of_range_rejected_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());

        // Point a.txt (offset field at the end of the info block's first record) past the data
        let mut raw = std::fs::read(&path).unwrap();
        let info_size = u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
        let first_meta = 12 + info_size - 16;
        raw[first_meta + 4..first_meta + 8].copy_from_slice(&3u32.to_le_bytes());
        std::fs::write(&path, &raw).unwrap();

        assert!(matches!(
            MiniPackReader::open(&path),
            Err(Error::CorruptInfoBlock(CorruptReason::EntryOutOfRange { index: 0, .. }))
        ));
    }

    #[test]
    fn test_stream_and_file_extraction() {
        let data: Vec<u8> = (0..COPY_CHUNK_SIZE * 3 + 5).map(|i| (i % 251) as u8).collect();
        let mut builder = MiniPackBuilder::new();
        builder.add_entry_from_buffer("big.bin", data.clone()).unwrap();
        builder.add_entry_from_buffer("zero", Vec::new()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, builder);
        let reader = MiniPackReader::open(&path).unwrap();

        let mut out: Vec<u8> = Vec::new();
        let copied = reader.read_entry_to_stream("big.bin", &mut out).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);

        let out_path = dir.path().join("big.out");
        reader.extract_entry_to_file("big.bin", &out_path).unwrap();
        assert_eq!(std::fs::read(&out_path).unwrap(), data);

        let zero_path = dir.path().join("zero.out");
        assert_eq!(reader.extract_entry_to_file("zero", &zero_path).unwrap(), 0);
        assert!(std::fs::read(&zero_path).unwrap().is_empty());
    }

    struct ClosedSink;

    impl PackSink for ClosedSink {
        fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_output_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());
        let reader = MiniPackReader::open(&path).unwrap();

        assert!(matches!(
            reader.read_entry_to_stream("a.txt", &mut ClosedSink),
            Err(Error::OutputWriteFailed(_))
        ));

        let bad_path = dir.path().join("missing-dir").join("out");
        assert!(matches!(
            reader.extract_entry_to_file("a.txt", &bad_path),
            Err(Error::OutputWriteFailed(_))
        ));
    }

    #[test]
    fn test_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MiniPackReader::open(dir.path().join("absent.pack")),
            Err(Error::FileOpenFailed { .. })
        ));

        let short = dir.path().join("short.pack");
        std::fs::write(&short, b"MINI").unwrap();
        assert!(matches!(
            MiniPackReader::open(&short),
            Err(Error::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn test_reader_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MiniPackReader>();
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_read_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(&dir, sample_builder());
        let reader = MiniPackReader::open(&path).unwrap();

        let results = reader.read_parallel(reader.entries());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), b"hello");
        assert!(results[1].as_ref().unwrap().is_empty());
    }
}
