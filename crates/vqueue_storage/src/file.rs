//! File-based storage backend for persistent segment files.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// Backs one segment file with OS file APIs. File handle and size live
/// under a single lock so the watermark can never drift from the bytes
/// actually written, and `size()` never touches the filesystem on the hot
/// path.
///
/// # Durability
///
/// `sync()` calls `File::sync_data()`. Data-only sync is enough here: the
/// engine separately fsyncs the containing directory whenever a file is
/// created, and `truncate()` uses the stronger `sync_all()` because it
/// changes the file length itself.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    file: File,
    size: u64,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// An existing file is opened for reading and appending; a missing
    /// file is created empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { file, size }),
        })
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut inner = self.inner.lock();

        let end = offset.saturating_add(len as u64);
        if end > inner.size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: inner.size,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        inner.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        inner.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut inner = self.inner.lock();
        let offset = inner.size;

        if !data.is_empty() {
            inner.file.seek(SeekFrom::End(0))?;
            inner.file.write_all(data)?;
            inner.size += data.len() as u64;
        }
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.lock().file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.lock().file.sync_data()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.inner.lock().size)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut inner = self.inner.lock();

        if new_size > inner.size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to {new_size} bytes, current size is {}",
                    inner.size
                ),
            )));
        }

        inner.file.set_len(new_size)?;
        inner.file.sync_all()?;
        inner.size = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn backend_in(dir: &tempfile::TempDir) -> FileBackend {
        FileBackend::open(&dir.path().join("seg.dat")).unwrap()
    }

    #[test]
    fn open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.path().exists());
    }

    #[test]
    fn append_advances_watermark() {
        let dir = tempdir().unwrap();
        let mut backend = backend_in(&dir);

        assert_eq!(backend.append(b"first").unwrap(), 0);
        assert_eq!(backend.append(b"-second").unwrap(), 5);
        assert_eq!(backend.size().unwrap(), 12);
        assert_eq!(&backend.read_at(5, 7).unwrap(), b"-second");
    }

    #[test]
    fn reads_are_bounds_checked() {
        let dir = tempdir().unwrap();
        let mut backend = backend_in(&dir);
        backend.append(b"short").unwrap();

        assert!(matches!(
            backend.read_at(3, 5),
            Err(StorageError::ReadPastEnd {
                offset: 3,
                len: 5,
                size: 5
            })
        ));
        assert!(backend.read_at(5, 0).unwrap().is_empty());
    }

    #[test]
    fn watermark_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg.dat");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persisted").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 9);
        assert_eq!(&backend.read_at(0, 9).unwrap(), b"persisted");
    }

    #[test]
    fn truncate_discards_tail_and_rejects_growth() {
        let dir = tempdir().unwrap();
        let mut backend = backend_in(&dir);
        backend.append(b"keep+drop").unwrap();

        backend.truncate(4).unwrap();
        assert_eq!(backend.size().unwrap(), 4);
        assert_eq!(&backend.read_at(0, 4).unwrap(), b"keep");
        assert!(backend.truncate(100).is_err());
    }

    #[test]
    fn append_after_truncate_reuses_offset() {
        let dir = tempdir().unwrap();
        let mut backend = backend_in(&dir);
        backend.append(b"aaaa").unwrap();
        backend.truncate(2).unwrap();

        assert_eq!(backend.append(b"bb").unwrap(), 2);
        assert_eq!(&backend.read_at(0, 4).unwrap(), b"aabb");
    }
}
