//! Forward-only byte sinks for pack output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Destination for pack bytes. Writes are appended in order; there is no seeking.
pub trait PackSink {
    /// Append `bytes` to the sink.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl PackSink for Vec<u8> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Buffered sink over any [`Write`] implementation.
pub struct WriterSink<W: Write> {
    inner: BufWriter<W>,
}

/// Buffered sink over a [`File`].
pub type FileSink = WriterSink<File>;

impl<W: Write> WriterSink<W> {
    /// Wrap `writer` in a buffered sink.
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
        }
    }

    /// Flush buffered bytes and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl FileSink {
    /// Create (or truncate) `path` and return a sink writing to it.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }
}

impl<W: Write> PackSink for WriterSink<W> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }
}

impl<W: Write> std::fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSink")
            .field("buffered", &self.inner.buffer().len())
            .finish()
    }
}
