//! A single append-only segment file.

use crate::error::QueueResult;
use vqueue_storage::StorageBackend;

/// One segment: a bounded run of frames in a single backing store.
///
/// The write offset is the backend size; it never decreases while the
/// segment is active. Once the manager rotates away from a segment it is
/// sealed by a final sync and never written again.
pub struct SegmentFile {
    seq: u64,
    backend: Box<dyn StorageBackend>,
}

impl SegmentFile {
    /// Wraps a backend as the segment with the given sequence number.
    #[must_use]
    pub fn new(seq: u64, backend: Box<dyn StorageBackend>) -> Self {
        Self { seq, backend }
    }

    /// Returns the segment's sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Appends raw frame bytes, returning the offset they start at.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error; a failed append is fatal to
    /// the current flush (recovery handles any torn tail on next open).
    pub fn append(&mut self, bytes: &[u8]) -> QueueResult<u64> {
        Ok(self.backend.append(bytes)?)
    }

    /// Forces all appended bytes to stable storage.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn sync(&mut self) -> QueueResult<()> {
        Ok(self.backend.sync()?)
    }

    /// Returns the current byte length.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn size(&self) -> QueueResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Truncates to `len` bytes. Recovery only.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn truncate(&mut self, len: u64) -> QueueResult<()> {
        Ok(self.backend.truncate(len)?)
    }

    /// Borrows the backing store for scanning.
    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }
}

impl std::fmt::Debug for SegmentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentFile")
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vqueue_storage::InMemoryBackend;

    #[test]
    fn append_offsets_are_monotonic() {
        let mut segment = SegmentFile::new(1, Box::new(InMemoryBackend::new()));
        assert_eq!(segment.seq(), 1);

        let first = segment.append(b"aaa").unwrap();
        let second = segment.append(b"bb").unwrap();
        assert_eq!(first, 0);
        assert_eq!(second, 3);
        assert_eq!(segment.size().unwrap(), 5);
    }

    #[test]
    fn truncate_moves_watermark_back() {
        let mut segment = SegmentFile::new(2, Box::new(InMemoryBackend::new()));
        segment.append(b"abcdef").unwrap();
        segment.truncate(4).unwrap();
        assert_eq!(segment.size().unwrap(), 4);
    }
}
