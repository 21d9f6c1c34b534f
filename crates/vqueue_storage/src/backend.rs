//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for the queue engine.
///
/// Storage backends are **opaque byte stores**. They provide append, read,
/// and durability primitives; the engine owns all format interpretation -
/// backends do not understand frames or segments.
///
/// # Invariants
///
/// - `append` returns the offset where the data starts; offsets within one
///   backend never decrease
/// - `read_at` returns exactly the bytes previously written at that offset
/// - after `sync` returns, all appended bytes survive process termination
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - for tests
/// - [`super::FileBackend`] - for persistent segment files
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the read would extend
    /// beyond the current size, or an I/O error from the underlying store.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data at the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs. After a failed append the
    /// store may contain a prefix of `data`; callers that need atomicity
    /// must handle this (the engine truncates torn tails during recovery).
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// Weaker than [`Self::sync`]: data may still sit in the OS page cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Forces all appended data to stable storage.
    ///
    /// This is the durability point: once `sync` returns, every byte
    /// appended so far survives a crash or power loss.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes.
    ///
    /// This is the offset at which the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Truncates the storage to `new_size` bytes and syncs.
    ///
    /// Used by recovery to discard a torn tail write.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` exceeds the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
