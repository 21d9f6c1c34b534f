//! Streaming frame scanner.
//!
//! Reads frames one-by-one from a storage backend with a bounded read
//! buffer, so recovery memory stays constant regardless of segment size.
//! The scanner is what recovery runs over the tail segment at configure
//! time; tests reuse it to verify the durability and ordering laws.
//!
//! # End-of-file classification
//!
//! - Trailing bytes that form an incomplete frame (short header, or a
//!   declared extent past EOF) are a **torn tail**: the scan ends cleanly
//!   and reports the last well-formed offset.
//! - A checksum mismatch on a frame whose extent ends exactly at EOF is
//!   also a torn tail (the write was cut inside the payload or trailer).
//! - Any malformed frame with further bytes beyond its declared extent is
//!   real corruption and surfaces as an error.

use crate::error::{QueueError, QueueResult};
use crate::frame::{self, Decoded, HEADER_SIZE};
use vqueue_storage::StorageBackend;

/// Read chunk size. Frames larger than this grow the buffer as needed.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A streaming iterator over the frames of one segment.
///
/// Yields `(offset, payload)` pairs in write order.
pub struct FrameScanner<'a> {
    backend: &'a dyn StorageBackend,
    total_size: u64,
    /// Offset of the next unparsed byte; always a frame boundary.
    current_offset: u64,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    frames: u64,
    torn: bool,
    finished: bool,
}

impl<'a> FrameScanner<'a> {
    /// Creates a scanner positioned at the start of the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn new(backend: &'a dyn StorageBackend) -> QueueResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            current_offset: 0,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            buffer_pos: 0,
            buffer_len: 0,
            frames: 0,
            torn: false,
            finished: false,
        })
    }

    /// Number of well-formed frames yielded so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// End offset of the last well-formed frame.
    ///
    /// After the scan completes this is the length recovery truncates to.
    #[must_use]
    pub fn durable_len(&self) -> u64 {
        self.current_offset
    }

    /// Whether the scan ended at a torn (partially written) tail.
    #[must_use]
    pub fn torn_tail(&self) -> bool {
        self.torn
    }

    /// Ensures at least `min` bytes are buffered from the current offset.
    ///
    /// Returns `false` when the file does not contain that many bytes past
    /// the current frame boundary.
    fn ensure_buffered(&mut self, min: usize) -> QueueResult<bool> {
        let available = self.buffer_len - self.buffer_pos;
        if available >= min {
            return Ok(true);
        }

        let remaining_in_file = (self.total_size - self.current_offset) as usize;
        if remaining_in_file < min {
            return Ok(false);
        }

        // Compact whatever is left to the front, then refill.
        if self.buffer_pos > 0 && available > 0 {
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
        }
        self.buffer_len = available;
        self.buffer_pos = 0;

        if min > self.buffer.len() {
            self.buffer.resize(min.next_power_of_two(), 0);
        }

        let read_offset = self.current_offset + self.buffer_len as u64;
        let want = std::cmp::min(
            self.buffer.len() - self.buffer_len,
            remaining_in_file - self.buffer_len,
        );
        let data = self.backend.read_at(read_offset, want)?;
        self.buffer[self.buffer_len..self.buffer_len + data.len()].copy_from_slice(&data);
        self.buffer_len += data.len();

        Ok(self.buffer_len - self.buffer_pos >= min)
    }

    /// Declared total frame length at the current position.
    ///
    /// Only valid once the header is buffered.
    fn declared_total(&self) -> usize {
        let p = self.buffer_pos;
        let payload_len = u32::from_le_bytes([
            self.buffer[p + 6],
            self.buffer[p + 7],
            self.buffer[p + 8],
            self.buffer[p + 9],
        ]) as usize;
        frame::encoded_len(payload_len)
    }

    fn next_frame(&mut self) -> QueueResult<Option<(u64, Vec<u8>)>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let start = self.current_offset;

            if !self.ensure_buffered(HEADER_SIZE)? {
                // Fewer than a header's worth of bytes remain.
                self.torn = self.total_size > self.current_offset;
                self.finished = true;
                return Ok(None);
            }

            match frame::decode(&self.buffer[self.buffer_pos..self.buffer_len]) {
                Ok(Decoded::Frame { payload, consumed }) => {
                    self.buffer_pos += consumed;
                    self.current_offset += consumed as u64;
                    self.frames += 1;
                    return Ok(Some((start, payload)));
                }
                Ok(Decoded::NeedMore) => {
                    let total = self.declared_total();
                    if !self.ensure_buffered(total)? {
                        // Declared extent runs past EOF: a torn tail write.
                        self.torn = true;
                        self.finished = true;
                        return Ok(None);
                    }
                    // Full frame is now buffered; decode again.
                }
                Err(err @ QueueError::ChecksumMismatch { .. }) => {
                    self.finished = true;
                    let total = self.declared_total() as u64;
                    if start + total == self.total_size {
                        // The bad frame is the last thing in the file: the
                        // write was cut inside the payload or trailer.
                        self.torn = true;
                        return Ok(None);
                    }
                    return Err(err);
                }
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                }
            }
        }
    }
}

impl Iterator for FrameScanner<'_> {
    type Item = QueueResult<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_frame() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::fmt::Debug for FrameScanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScanner")
            .field("total_size", &self.total_size)
            .field("current_offset", &self.current_offset)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// Result of scanning a segment's tail for recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailScan {
    /// Number of well-formed frames in the segment.
    pub frames: u64,
    /// End offset of the last well-formed frame.
    pub durable_len: u64,
    /// Whether trailing bytes after `durable_len` form a torn write.
    pub torn: bool,
}

/// Scans a whole segment, classifying its tail.
///
/// # Errors
///
/// Returns an error on interior corruption (a malformed frame that is not
/// the torn tail) or on I/O failure.
pub fn scan_tail(backend: &dyn StorageBackend) -> QueueResult<TailScan> {
    let mut scanner = FrameScanner::new(backend)?;
    for item in scanner.by_ref() {
        item?;
    }
    Ok(TailScan {
        frames: scanner.frames(),
        durable_len: scanner.durable_len(),
        torn: scanner.torn_tail(),
    })
}
