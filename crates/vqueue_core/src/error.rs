//! Error types for the queue engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] vqueue_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation attempted before the handle was bound to a name and path.
    #[error("queue is not configured")]
    NotConfigured,

    /// The handle is already bound to a name and path.
    #[error("queue is already configured")]
    AlreadyConfigured,

    /// The handle has been closed; no further operations are possible.
    #[error("queue is closed")]
    Closed,

    /// The path is unusable as a queue directory.
    #[error("invalid queue path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A frame on disk is malformed.
    #[error("corrupt frame: {message}")]
    CorruptFrame {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected while decoding a frame.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the frame.
        expected: u32,
        /// Checksum computed over the frame bytes.
        actual: u32,
    },

    /// Pushed value exceeds the maximum frame payload size.
    #[error("payload too large: {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        len: usize,
        /// Maximum accepted payload size.
        max: usize,
    },

    /// A flush failed and the staged frames were discarded.
    #[error("flush failed, {dropped_frames} staged frame(s) discarded: {source}")]
    FlushFailed {
        /// Number of staged frames that were lost.
        dropped_frames: usize,
        /// The underlying error.
        #[source]
        source: Box<QueueError>,
    },
}

impl QueueError {
    /// Creates a corrupt frame error.
    pub fn corrupt_frame(message: impl Into<String>) -> Self {
        Self::CorruptFrame {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
