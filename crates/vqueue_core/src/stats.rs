//! Queue statistics and telemetry.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for a queue handle.
///
/// All counters are atomic and can be read while pushes are in progress.
/// Values are monotonically increasing for the lifetime of the handle.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Values accepted by `push`.
    pushes: AtomicU64,
    /// Frame bytes written to segment files (envelope included).
    bytes_written: AtomicU64,
    /// Completed flush operations.
    flushes: AtomicU64,
    /// Segment rotations.
    rotations: AtomicU64,
    /// Frames found in the tail segment during recovery at configure time.
    frames_recovered: AtomicU64,
}

impl QueueStats {
    /// Creates a new stats instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_push(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, bytes: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recovered(&self, frames: u64) {
        self.frames_recovered.store(frames, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pushes: self.pushes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            frames_recovered: self.frames_recovered.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`QueueStats`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Values accepted by `push`.
    pub pushes: u64,
    /// Frame bytes written to segment files.
    pub bytes_written: u64,
    /// Completed flush operations.
    pub flushes: u64,
    /// Segment rotations.
    pub rotations: u64,
    /// Frames found in the tail segment during recovery.
    pub frames_recovered: u64,
}
