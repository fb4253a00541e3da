//! MiniPack entry metadata.

/// One entry of a parsed pack index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MiniPackEntry {
    /// Stored name
    pub name: String,
    /// Data size in bytes
    pub size: u32,
    /// Offset relative to the start of the data section
    pub offset: u32,
}

impl MiniPackEntry {
    /// One past the entry's last byte, relative to the data section.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    /// Whether the entry holds no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
