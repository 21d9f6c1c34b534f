//! Queue configuration.

/// When buffered frames are committed and synced to stable storage.
///
/// The policy is the durability/throughput dial of the engine:
///
/// - [`FlushPolicy::EveryPush`] syncs on every push. Every acknowledged
///   value is on disk when `push` returns, at the cost of one fsync per
///   push - prohibitive for high-volume runs.
/// - [`FlushPolicy::Batched`] stages frames in memory and flushes when
///   either threshold is reached. A crash loses at most the staged window;
///   everything flushed earlier is durable. This is the default: sustained
///   million-push runs are only possible with batched commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Flush and sync after every push.
    EveryPush,
    /// Flush and sync when either staging threshold is reached.
    Batched {
        /// Flush once this many bytes are staged.
        max_bytes: usize,
        /// Flush once this many frames are staged.
        max_frames: usize,
    },
}

impl FlushPolicy {
    /// Default staging limit in bytes for the batched policy.
    pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;
    /// Default staging limit in frames for the batched policy.
    pub const DEFAULT_MAX_FRAMES: usize = 1024;

    /// The default batched policy.
    #[must_use]
    pub const fn batched() -> Self {
        Self::Batched {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            max_frames: Self::DEFAULT_MAX_FRAMES,
        }
    }
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self::batched()
    }
}

/// Configuration for a queue handle.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Whether to create the queue directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Maximum size of a segment file before rotation.
    ///
    /// Rotation happens at flush granularity, so a segment can exceed this
    /// by at most one staged batch.
    pub max_segment_size: u64,

    /// The active flush policy.
    pub flush_policy: FlushPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_segment_size: 256 * 1024 * 1024, // 256 MB
            flush_policy: FlushPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the queue directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the maximum segment file size before rotation.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }

    /// Sets the flush policy.
    #[must_use]
    pub const fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }
}
