/// The byte range of the input a decoded record was read from.
///
/// Every decoder records its own start offset before reading and its length afterwards, so
/// that tooling can map a decoded value back to its bytes in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileRegion {
    /// File offset of the first byte of the record
    pub start: u64,
    /// Number of bytes the record occupies
    pub length: u64,
}

impl FileRegion {
    /// Create a region from a start offset and a length.
    #[must_use]
    pub fn new(start: u64, length: u64) -> FileRegion {
        FileRegion { start, length }
    }

    /// Region covering `start..end` cursor positions.
    pub(crate) fn between(start: usize, end: usize) -> FileRegion {
        FileRegion {
            start: start as u64,
            length: end.saturating_sub(start) as u64,
        }
    }

    /// File offset one past the last byte of the record.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Returns `true` if `offset` falls inside the record.
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }
}
