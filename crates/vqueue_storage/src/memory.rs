//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;

/// An in-memory storage backend.
///
/// Holds the whole byte image in a vector. Used by unit tests, and by
/// recovery tests in particular: [`InMemoryBackend::with_data`] seeds a
/// backend with an arbitrary image, including torn or corrupted tails that
/// are awkward to produce through the write path.
///
/// # Example
///
/// ```rust
/// use vqueue_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.append(b"test data").unwrap();
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    image: Mutex<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory backend seeded with `image`.
    #[must_use]
    pub fn with_data(image: Vec<u8>) -> Self {
        Self {
            image: Mutex::new(image),
        }
    }

    /// Returns a copy of the full byte image.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.image.lock().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let image = self.image.lock();
        let size = image.len() as u64;

        let Some(end) = offset.checked_add(len as u64).filter(|end| *end <= size) else {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        };
        Ok(image[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut image = self.image.lock();
        let offset = image.len() as u64;
        image.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.image.lock().len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut image = self.image.lock();
        if new_size > image.len() as u64 {
            return Err(StorageError::corrupted(format!(
                "cannot truncate to {new_size} bytes, current size is {}",
                image.len()
            )));
        }
        image.truncate(new_size as usize);
        Ok(())
    }
}
