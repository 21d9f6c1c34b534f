//! Storage error types.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read was requested past the current end of the store.
    #[error("read past end: {len} bytes at offset {offset}, store holds {size}")]
    ReadPastEnd {
        /// Offset the read started at.
        offset: u64,
        /// Bytes requested.
        len: usize,
        /// Bytes the store currently holds.
        size: u64,
    },

    /// The byte store is in a state the backend cannot repair.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The backend was closed and can no longer serve requests.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
