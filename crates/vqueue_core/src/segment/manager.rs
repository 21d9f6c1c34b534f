//! Segment ownership, rotation, and startup recovery.

use crate::config::QueueConfig;
use crate::dir::QueueDir;
use crate::error::QueueResult;
use crate::segment::file::SegmentFile;
use crate::segment::scan::scan_tail;
use tracing::{debug, warn};
use vqueue_storage::FileBackend;

/// Owns the active segment of one queue and rotates it at the size
/// threshold.
///
/// Sequence numbers start at 1 and are strictly increasing for the life of
/// the queue directory. On open, the next sequence is derived from the
/// highest number present on disk, so writes always continue after
/// everything previously written.
pub struct SegmentManager {
    dir: QueueDir,
    active: SegmentFile,
    next_seq: u64,
    max_segment_size: u64,
    recovered_frames: u64,
}

impl SegmentManager {
    /// Opens the segment manager for a queue directory, running recovery.
    ///
    /// With no prior segments, segment 1 is created. Otherwise the
    /// highest-numbered segment is scanned: a torn tail write is truncated
    /// to the last well-formed frame; interior corruption is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or on corruption that truncation
    /// cannot repair; the queue never reaches Ready in that case.
    pub fn open(dir: QueueDir, config: &QueueConfig) -> QueueResult<Self> {
        let segments = dir.list_segments()?;

        let (active, next_seq, recovered_frames) = match segments.last() {
            None => {
                let backend = FileBackend::open(&dir.segment_path(1))?;
                dir.sync()?;
                debug!(dir = %dir.root().display(), "created first segment");
                (SegmentFile::new(1, Box::new(backend)), 2, 0)
            }
            Some(&(seq, ref path)) => {
                let backend = FileBackend::open(path)?;
                let scan = scan_tail(&backend)?;
                let mut segment = SegmentFile::new(seq, Box::new(backend));

                if scan.torn {
                    let size = segment.size()?;
                    warn!(
                        segment = seq,
                        durable_len = scan.durable_len,
                        dropped_bytes = size - scan.durable_len,
                        "truncating torn tail write"
                    );
                    segment.truncate(scan.durable_len)?;
                }
                debug!(
                    segment = seq,
                    frames = scan.frames,
                    len = scan.durable_len,
                    "recovered tail segment"
                );
                (segment, seq + 1, scan.frames)
            }
        };

        Ok(Self {
            dir,
            active,
            next_seq,
            max_segment_size: config.max_segment_size,
            recovered_frames,
        })
    }

    /// Frames found in the tail segment during recovery.
    #[must_use]
    pub fn recovered_frames(&self) -> u64 {
        self.recovered_frames
    }

    /// Sequence number of the active segment.
    #[must_use]
    pub fn active_seq(&self) -> u64 {
        self.active.seq()
    }

    /// Byte length of the active segment.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn active_size(&self) -> QueueResult<u64> {
        self.active.size()
    }

    /// Rotates to a fresh segment if `pending` more bytes would push the
    /// active segment past the size threshold.
    ///
    /// The old segment gets a final sync before the new file is created,
    /// and the directory is fsynced so the new file's metadata survives a
    /// crash. An empty active segment is never rotated: a batch larger
    /// than the threshold lands alone in the current file.
    ///
    /// Returns whether a rotation happened.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the final sync or file creation.
    pub fn rotate_if_needed(&mut self, pending: u64) -> QueueResult<bool> {
        let size = self.active.size()?;
        if size == 0 || size + pending <= self.max_segment_size {
            return Ok(false);
        }

        self.active.sync()?;

        let seq = self.next_seq;
        let backend = FileBackend::open(&self.dir.segment_path(seq))?;
        self.dir.sync()?;
        debug!(from = self.active.seq(), to = seq, "rotated segment");

        self.active = SegmentFile::new(seq, Box::new(backend));
        self.next_seq += 1;
        Ok(true)
    }

    /// Appends raw frame bytes to the active segment.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn append(&mut self, bytes: &[u8]) -> QueueResult<u64> {
        self.active.append(bytes)
    }

    /// Syncs the active segment to stable storage.
    ///
    /// # Errors
    ///
    /// Propagates the underlying storage error.
    pub fn sync(&mut self) -> QueueResult<()> {
        self.active.sync()
    }
}

impl std::fmt::Debug for SegmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentManager")
            .field("active_seq", &self.active.seq())
            .field("next_seq", &self.next_seq)
            .field("max_segment_size", &self.max_segment_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;
    use crate::frame::encode;
    use tempfile::tempdir;

    fn open_manager(path: &std::path::Path, config: &QueueConfig) -> SegmentManager {
        let dir = QueueDir::open(path, "q", true).unwrap();
        SegmentManager::open(dir, config).unwrap()
    }

    #[test]
    fn fresh_directory_starts_at_segment_one() {
        let temp = tempdir().unwrap();
        let manager = open_manager(temp.path(), &QueueConfig::default());

        assert_eq!(manager.active_seq(), 1);
        assert_eq!(manager.recovered_frames(), 0);
        assert!(temp.path().join("q").join("seg-000001.dat").exists());
    }

    #[test]
    fn rotation_increments_sequence() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().max_segment_size(32);
        let mut manager = open_manager(temp.path(), &config);

        manager.append(&[0u8; 30]).unwrap();
        assert!(manager.rotate_if_needed(30).unwrap());
        assert_eq!(manager.active_seq(), 2);
        assert_eq!(manager.active_size().unwrap(), 0);
    }

    #[test]
    fn empty_segment_is_never_rotated() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().max_segment_size(8);
        let mut manager = open_manager(temp.path(), &config);

        // Oversized batch into an empty segment stays put.
        assert!(!manager.rotate_if_needed(100).unwrap());
        assert_eq!(manager.active_seq(), 1);
    }

    #[test]
    fn reopen_continues_from_highest_sequence() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().max_segment_size(16);

        {
            let mut manager = open_manager(temp.path(), &config);
            manager.append(&encode(b"0123456789").unwrap()).unwrap();
            manager.rotate_if_needed(24).unwrap();
            manager.append(&encode(b"abcdefghij").unwrap()).unwrap();
            manager.sync().unwrap();
        }

        let manager = open_manager(temp.path(), &config);
        assert_eq!(manager.active_seq(), 2);
        assert_eq!(manager.recovered_frames(), 1);
    }

    #[test]
    fn torn_tail_is_truncated_on_open() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default();
        let good = encode(b"good frame").unwrap();
        let good_len = good.len() as u64;

        {
            let mut manager = open_manager(temp.path(), &config);
            manager.append(&good).unwrap();
            let torn = encode(b"torn frame").unwrap();
            manager.append(&torn[..torn.len() - 3]).unwrap();
            manager.sync().unwrap();
        }

        let manager = open_manager(temp.path(), &config);
        assert_eq!(manager.recovered_frames(), 1);
        assert_eq!(manager.active_size().unwrap(), good_len);
    }

    #[test]
    fn interior_corruption_fails_open() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default();

        {
            let mut manager = open_manager(temp.path(), &config);
            let mut bad = encode(b"will be corrupted").unwrap();
            bad[12] ^= 0xFF;
            manager.append(&bad).unwrap();
            manager.append(&encode(b"fine").unwrap()).unwrap();
            manager.sync().unwrap();
        }

        let dir = QueueDir::open(temp.path(), "q", true).unwrap();
        let result = SegmentManager::open(dir, &config);
        assert!(matches!(result, Err(QueueError::ChecksumMismatch { .. })));
    }
}
