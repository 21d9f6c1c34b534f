//! The queue handle: the top-level object callers hold.

use crate::buffer::WriteBuffer;
use crate::config::{FlushPolicy, QueueConfig};
use crate::dir::QueueDir;
use crate::error::{QueueError, QueueResult};
use crate::frame;
use crate::segment::SegmentManager;
use crate::stats::{QueueStats, StatsSnapshot};
use parking_lot::Mutex;
use std::path::Path;
use tracing::warn;

/// A durable, append-only, named queue bound to a directory.
///
/// The handle moves through three states:
///
/// ```text
/// Unconfigured --configure--> Ready --close--> Closed
/// ```
///
/// `configure` binds the identity exactly once: it creates
/// `<path>/<name>/` if missing, recovers the durable write position from
/// the segment files already there, and only then accepts pushes. A second
/// `configure` fails with [`QueueError::AlreadyConfigured`]; there is no
/// way back out of Closed.
///
/// # Durability
///
/// `push` acknowledges acceptance into the durable pipeline, not "on disk
/// yet": with the default batched [`FlushPolicy`] a value is durable no
/// later than the next flush boundary. [`FlushPolicy::EveryPush`] makes
/// every acknowledged push durable before it returns. If a flush fails,
/// the staged batch is discarded and the error reports how many frames
/// were dropped; the handle stays usable and retry is the caller's call.
///
/// # Thread Safety
///
/// One internal mutex serializes `push`, `flush`, and `close`, with at most
/// one flush in flight, so `&Queue` can be shared across threads. Only one
/// live handle may operate against a given `(name, path)`; cross-process
/// arbitration is not provided.
///
/// # Example
///
/// ```no_run
/// use vqueue_core::Queue;
///
/// let queue = Queue::open("example_queue", "./data/out")?;
/// queue.push(b"tst_0")?;
/// queue.close()?;
/// # Ok::<(), vqueue_core::QueueError>(())
/// ```
pub struct Queue {
    config: QueueConfig,
    inner: Mutex<Inner>,
    stats: QueueStats,
}

enum Inner {
    Unconfigured,
    Ready(ReadyState),
    Closed,
}

struct ReadyState {
    name: String,
    segments: SegmentManager,
    buffer: WriteBuffer,
}

impl Queue {
    /// Creates an unconfigured handle with the given configuration.
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::Unconfigured),
            stats: QueueStats::new(),
        }
    }

    /// Creates and configures a handle with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns any error `configure` can return.
    pub fn open(name: &str, path: impl AsRef<Path>) -> QueueResult<Self> {
        Self::open_with_config(name, path, QueueConfig::default())
    }

    /// Creates and configures a handle with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns any error `configure` can return.
    pub fn open_with_config(
        name: &str,
        path: impl AsRef<Path>,
        config: QueueConfig,
    ) -> QueueResult<Self> {
        let queue = Self::new(config);
        queue.configure(name, path)?;
        Ok(queue)
    }

    /// Binds the handle to `(name, path)` and recovers on-disk state.
    ///
    /// Creates `<path>/<name>/` if absent, scans existing segments to find
    /// the durable write position, and truncates a torn tail write left by
    /// a crash. Blocks for the duration of the recovery scan.
    ///
    /// # Errors
    ///
    /// - [`QueueError::AlreadyConfigured`] if the handle is already bound
    /// - [`QueueError::Closed`] if the handle was closed
    /// - [`QueueError::InvalidPath`] if the location is unusable
    /// - [`QueueError::CorruptFrame`] / [`QueueError::ChecksumMismatch`]
    ///   on interior corruption; the handle stays unconfigured
    pub fn configure(&self, name: &str, path: impl AsRef<Path>) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        match &*inner {
            Inner::Unconfigured => {}
            Inner::Ready(_) => return Err(QueueError::AlreadyConfigured),
            Inner::Closed => return Err(QueueError::Closed),
        }

        let dir = QueueDir::open(path.as_ref(), name, self.config.create_if_missing)?;
        let segments = SegmentManager::open(dir, &self.config)?;
        self.stats.record_recovered(segments.recovered_frames());

        *inner = Inner::Ready(ReadyState {
            name: name.to_owned(),
            segments,
            buffer: WriteBuffer::new(),
        });
        Ok(())
    }

    /// Appends one value to the queue.
    ///
    /// The value is staged as a frame; when the active flush policy says
    /// so, the staged batch is committed (written and synced) before this
    /// returns, so the call can block on I/O.
    ///
    /// # Errors
    ///
    /// - [`QueueError::NotConfigured`] before `configure`
    /// - [`QueueError::Closed`] after `close`
    /// - [`QueueError::PayloadTooLarge`] for oversized values (nothing is
    ///   staged)
    /// - [`QueueError::FlushFailed`] when the commit fails; the staged
    ///   batch is dropped and a subsequent push may be retried
    pub fn push(&self, value: &[u8]) -> QueueResult<()> {
        let encoded = frame::encode(value)?;

        let mut inner = self.inner.lock();
        let state = match &mut *inner {
            Inner::Ready(state) => state,
            Inner::Unconfigured => return Err(QueueError::NotConfigured),
            Inner::Closed => return Err(QueueError::Closed),
        };

        state.buffer.stage(&encoded);
        self.stats.record_push();

        if state.buffer.should_flush(self.config.flush_policy) {
            flush_state(state, &self.stats)?;
        }
        Ok(())
    }

    /// Commits all staged frames to the active segment and syncs.
    ///
    /// # Errors
    ///
    /// Same state errors as [`Queue::push`]; [`QueueError::FlushFailed`]
    /// if the commit fails.
    pub fn flush(&self) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        match &mut *inner {
            Inner::Ready(state) => flush_state(state, &self.stats),
            Inner::Unconfigured => Err(QueueError::NotConfigured),
            Inner::Closed => Err(QueueError::Closed),
        }
    }

    /// Flushes, syncs, and releases file handles. Idempotent.
    ///
    /// The handle is Closed afterwards even if the final flush failed; the
    /// error is still returned so the caller knows the staged tail was
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns the final flush/sync error, if any.
    pub fn close(&self) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        match std::mem::replace(&mut *inner, Inner::Closed) {
            Inner::Ready(mut state) => {
                let result = flush_state(&mut state, &self.stats);
                let sync_result = state.segments.sync();
                result.and(sync_result)
            }
            Inner::Unconfigured | Inner::Closed => Ok(()),
        }
    }

    /// The queue name, once configured.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        match &*self.inner.lock() {
            Inner::Ready(state) => Some(state.name.clone()),
            _ => None,
        }
    }

    /// The flush policy this handle runs with.
    #[must_use]
    pub fn flush_policy(&self) -> FlushPolicy {
        self.config.flush_policy
    }

    /// A point-in-time copy of the handle's operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Commits the staged batch: rotate if needed, append, sync.
///
/// On failure the batch is gone; see the flush-failure policy on [`Queue`].
fn flush_state(state: &mut ReadyState, stats: &QueueStats) -> QueueResult<()> {
    if state.buffer.is_empty() {
        return Ok(());
    }

    let (bytes, frames) = state.buffer.take();
    let commit = (|| {
        if state.segments.rotate_if_needed(bytes.len() as u64)? {
            stats.record_rotation();
        }
        state.segments.append(&bytes)?;
        state.segments.sync()
    })();

    match commit {
        Ok(()) => {
            stats.record_flush(bytes.len() as u64);
            Ok(())
        }
        Err(source) => Err(QueueError::FlushFailed {
            dropped_frames: frames,
            source: Box::new(source),
        }),
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if let Inner::Ready(mut state) = std::mem::replace(&mut *inner, Inner::Closed) {
            if let Err(e) = flush_state(&mut state, &self.stats) {
                warn!(queue = %state.name, error = %e, "final flush failed on drop");
            }
            if let Err(e) = state.segments.sync() {
                warn!(queue = %state.name, error = %e, "final sync failed on drop");
            }
        }
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name())
            .field("flush_policy", &self.config.flush_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::FrameScanner;
    use tempfile::tempdir;
    use vqueue_storage::FileBackend;

    fn read_back(dir: &std::path::Path, name: &str) -> Vec<Vec<u8>> {
        let queue_dir = QueueDir::open(dir, name, false).unwrap();
        let mut values = Vec::new();
        for (_, path) in queue_dir.list_segments().unwrap() {
            let backend = FileBackend::open(&path).unwrap();
            for item in FrameScanner::new(&backend).unwrap() {
                values.push(item.unwrap().1);
            }
        }
        values
    }

    #[test]
    fn push_before_configure_fails() {
        let queue = Queue::new(QueueConfig::default());
        assert!(matches!(queue.push(b"x"), Err(QueueError::NotConfigured)));
        assert!(matches!(queue.flush(), Err(QueueError::NotConfigured)));
    }

    #[test]
    fn configure_twice_fails() {
        let temp = tempdir().unwrap();
        let queue = Queue::new(QueueConfig::default());

        queue.configure("q", temp.path()).unwrap();
        assert!(matches!(
            queue.configure("q", temp.path()),
            Err(QueueError::AlreadyConfigured)
        ));
        // The original binding stays usable.
        queue.push(b"still works").unwrap();
    }

    #[test]
    fn failed_configure_leaves_handle_unconfigured() {
        let temp = tempdir().unwrap();
        let queue = Queue::new(QueueConfig::default());

        assert!(queue.configure("bad/name", temp.path()).is_err());
        // A good configure afterwards succeeds.
        queue.configure("good", temp.path()).unwrap();
        queue.push(b"x").unwrap();
    }

    #[test]
    fn close_is_idempotent_and_terminal() {
        let temp = tempdir().unwrap();
        let queue = Queue::open("q", temp.path()).unwrap();
        queue.push(b"value").unwrap();

        queue.close().unwrap();
        queue.close().unwrap();
        assert!(matches!(queue.push(b"more"), Err(QueueError::Closed)));
        assert!(matches!(
            queue.configure("q", temp.path()),
            Err(QueueError::Closed)
        ));
    }

    #[test]
    fn pushed_values_survive_close_and_reopen() {
        let temp = tempdir().unwrap();

        let queue = Queue::open("orders", temp.path()).unwrap();
        for i in 0..100 {
            queue.push(format!("tst_{i}").as_bytes()).unwrap();
        }
        queue.close().unwrap();

        let values = read_back(temp.path(), "orders");
        assert_eq!(values.len(), 100);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(value, format!("tst_{i}").as_bytes());
        }

        // Reopen and append more; order is preserved across the reopen.
        let queue = Queue::open("orders", temp.path()).unwrap();
        queue.push(b"tst_100").unwrap();
        queue.close().unwrap();

        let values = read_back(temp.path(), "orders");
        assert_eq!(values.len(), 101);
        assert_eq!(values[100], b"tst_100");
    }

    #[test]
    fn every_push_policy_is_durable_immediately() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().flush_policy(FlushPolicy::EveryPush);
        let queue = Queue::open_with_config("q", temp.path(), config).unwrap();

        queue.push(b"committed").unwrap();

        // Visible on disk without close.
        let values = read_back(temp.path(), "q");
        assert_eq!(values, vec![b"committed".to_vec()]);
    }

    #[test]
    fn batched_policy_stages_until_threshold() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().flush_policy(FlushPolicy::Batched {
            max_bytes: 1024 * 1024,
            max_frames: 100,
        });
        let queue = Queue::open_with_config("q", temp.path(), config).unwrap();

        queue.push(b"staged only").unwrap();
        assert!(read_back(temp.path(), "q").is_empty());

        queue.flush().unwrap();
        assert_eq!(read_back(temp.path(), "q").len(), 1);
    }

    #[test]
    fn rotation_produces_new_segments_without_spanning_frames() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default()
            .max_segment_size(256)
            .flush_policy(FlushPolicy::EveryPush);
        let queue = Queue::open_with_config("q", temp.path(), config).unwrap();

        for i in 0..50 {
            queue.push(format!("value number {i}").as_bytes()).unwrap();
        }
        queue.close().unwrap();

        let queue_dir = QueueDir::open(temp.path(), "q", false).unwrap();
        let segments = queue_dir.list_segments().unwrap();
        assert!(segments.len() > 1, "expected rotation to occur");

        // Sequence numbers strictly increase and every segment scans
        // cleanly on its own - no frame spans two files.
        let mut total = 0u64;
        let mut prev_seq = 0u64;
        for (seq, path) in segments {
            assert!(seq > prev_seq);
            prev_seq = seq;
            let backend = FileBackend::open(&path).unwrap();
            let scan = crate::segment::scan_tail(&backend).unwrap();
            assert!(!scan.torn);
            total += scan.frames;
        }
        assert_eq!(total, 50);
    }

    #[test]
    fn stats_track_pushes_and_flushes() {
        let temp = tempdir().unwrap();
        let config = QueueConfig::default().flush_policy(FlushPolicy::EveryPush);
        let queue = Queue::open_with_config("q", temp.path(), config).unwrap();

        queue.push(b"a").unwrap();
        queue.push(b"b").unwrap();

        let snap = queue.stats();
        assert_eq!(snap.pushes, 2);
        assert_eq!(snap.flushes, 2);
        assert!(snap.bytes_written > 0);
    }

    #[test]
    fn drop_flushes_staged_frames() {
        let temp = tempdir().unwrap();
        {
            let queue = Queue::open("q", temp.path()).unwrap();
            queue.push(b"staged at drop").unwrap();
            // No close; Drop must flush.
        }
        let values = read_back(temp.path(), "q");
        assert_eq!(values, vec![b"staged at drop".to_vec()]);
    }

    #[test]
    fn recovered_frames_reported_in_stats() {
        let temp = tempdir().unwrap();
        {
            let queue = Queue::open("q", temp.path()).unwrap();
            queue.push(b"one").unwrap();
            queue.push(b"two").unwrap();
            queue.close().unwrap();
        }

        let queue = Queue::open("q", temp.path()).unwrap();
        assert_eq!(queue.stats().frames_recovered, 2);
    }
}
