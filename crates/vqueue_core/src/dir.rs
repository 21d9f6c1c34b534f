//! Queue directory management.
//!
//! On-disk layout for a queue bound to `(name, path)`:
//!
//! ```text
//! <path>/<name>/
//! ├─ seg-000001.dat
//! ├─ seg-000002.dat
//! └─ ...
//! ```
//!
//! The file name encodes the segment's sequence number, so sorting the
//! directory listing numerically reconstructs write order without a
//! separate index file. There is no lock file: only one live handle may
//! operate against a given `(name, path)`; arbitration is the caller's
//! responsibility.

use crate::error::{QueueError, QueueResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Prefix of segment file names.
const SEGMENT_PREFIX: &str = "seg-";
/// Extension of segment file names.
const SEGMENT_SUFFIX: &str = ".dat";

/// The directory holding one queue's segment files.
#[derive(Debug, Clone)]
pub struct QueueDir {
    root: PathBuf,
}

impl QueueDir {
    /// Opens or creates the directory for queue `name` under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidPath`] if:
    /// - `name` is empty or contains path separators or `..`
    /// - the location exists but is not a directory
    /// - the directory is missing and `create_if_missing` is false
    pub fn open(path: &Path, name: &str, create_if_missing: bool) -> QueueResult<Self> {
        validate_name(path, name)?;
        let root = path.join(name);

        if !root.exists() {
            if !create_if_missing {
                return Err(QueueError::invalid_path(
                    &root,
                    "queue directory does not exist",
                ));
            }
            fs::create_dir_all(&root)?;
        }

        if !root.is_dir() {
            return Err(QueueError::invalid_path(&root, "path is not a directory"));
        }

        Ok(Self { root })
    }

    /// Returns the queue directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for the segment with the given sequence number.
    #[must_use]
    pub fn segment_path(&self, seq: u64) -> PathBuf {
        self.root.join(format!("{SEGMENT_PREFIX}{seq:06}{SEGMENT_SUFFIX}"))
    }

    /// Lists existing segment files, sorted by embedded sequence number.
    ///
    /// File names that don't match the segment naming scheme are skipped
    /// with a warning; a stray file must not break recovery of the ones
    /// that do.
    pub fn list_segments(&self) -> QueueResult<Vec<(u64, PathBuf)>> {
        let mut segments = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            match parse_segment_name(name) {
                Some(seq) => segments.push((seq, entry.path())),
                None => {
                    warn!(file = name, dir = %self.root.display(), "ignoring non-segment file");
                }
            }
        }

        segments.sort_by_key(|(seq, _)| *seq);
        Ok(segments)
    }

    /// Syncs the queue directory so file creations and renames are durable.
    #[cfg(unix)]
    pub fn sync(&self) -> QueueResult<()> {
        let dir = fs::File::open(&self.root)?;
        dir.sync_all()?;
        Ok(())
    }

    /// Syncs the queue directory so file creations and renames are durable.
    ///
    /// Directory fsync is not supported on this platform; the NTFS journal
    /// provides equivalent metadata durability.
    #[cfg(not(unix))]
    pub fn sync(&self) -> QueueResult<()> {
        Ok(())
    }
}

/// Extracts the sequence number from a segment file name.
fn parse_segment_name(name: &str) -> Option<u64> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}

fn validate_name(path: &Path, name: &str) -> QueueResult<()> {
    if name.is_empty() {
        return Err(QueueError::invalid_path(path, "queue name is empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(QueueError::invalid_path(
            path,
            format!("queue name {name:?} must be a single path component"),
        ));
    }
    Ok(())
}
