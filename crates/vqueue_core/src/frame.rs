//! Frame codec: the on-disk record format.
//!
//! Every pushed value is stored as one self-describing frame:
//!
//! ```text
//! ┌───────────┬─────────────┬────────────┬───────────┬───────────┐
//! │ magic (4) │ version (2) │ length (4) │ payload   │ crc32 (4) │
//! └───────────┴─────────────┴────────────┴───────────┴───────────┘
//! ```
//!
//! All integers are little-endian. The CRC32 (IEEE) covers everything
//! before it. Encoding is pure and deterministic; this module is the only
//! place the length-prefix framing is defined.

use crate::error::{QueueError, QueueResult};

/// Magic bytes identifying a frame.
pub const FRAME_MAGIC: [u8; 4] = *b"VQFR";

/// Current frame format version.
pub const FRAME_VERSION: u16 = 1;

/// Envelope size before the payload: magic (4) + version (2) + length (4).
pub const HEADER_SIZE: usize = 10;

/// CRC32 trailer size.
pub const CRC_SIZE: usize = 4;

/// Maximum payload size accepted by [`encode`].
///
/// The length field is 4 bytes, so anything larger cannot be framed.
pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize;

/// Outcome of a [`decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete frame was parsed.
    Frame {
        /// The payload bytes.
        payload: Vec<u8>,
        /// Total bytes consumed from the input, envelope included.
        consumed: usize,
    },
    /// The input cannot contain a complete frame; more bytes are needed.
    NeedMore,
}

/// Returns the encoded size of a frame carrying `payload_len` bytes.
#[must_use]
pub const fn encoded_len(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len + CRC_SIZE
}

/// Encodes a value into a frame.
///
/// # Errors
///
/// Returns [`QueueError::PayloadTooLarge`] if the value exceeds
/// [`MAX_PAYLOAD_SIZE`].
pub fn encode(payload: &[u8]) -> QueueResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(QueueError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(encoded_len(payload.len()));
    buf.extend_from_slice(&FRAME_MAGIC);
    buf.extend_from_slice(&FRAME_VERSION.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Decodes one frame from the start of `buf`.
///
/// Returns [`Decoded::NeedMore`] when `buf` is a strict prefix of a frame
/// (short header, or declared extent past the end of the input). The caller
/// decides what a short read means: mid-stream it means "read more bytes",
/// at the end of a file it means a torn tail write.
///
/// # Errors
///
/// - [`QueueError::CorruptFrame`] for bad magic or an unsupported version
/// - [`QueueError::ChecksumMismatch`] when the CRC32 trailer does not match
pub fn decode(buf: &[u8]) -> QueueResult<Decoded> {
    if buf.len() < HEADER_SIZE {
        return Ok(Decoded::NeedMore);
    }

    if buf[0..4] != FRAME_MAGIC {
        return Err(QueueError::corrupt_frame("invalid magic"));
    }

    let version = u16::from_le_bytes([buf[4], buf[5]]);
    if version > FRAME_VERSION {
        return Err(QueueError::corrupt_frame(format!(
            "unsupported frame version {version}"
        )));
    }

    let payload_len = u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]) as usize;
    let total = encoded_len(payload_len);
    if buf.len() < total {
        return Ok(Decoded::NeedMore);
    }

    let stored_crc = u32::from_le_bytes([
        buf[total - 4],
        buf[total - 3],
        buf[total - 2],
        buf[total - 1],
    ]);
    let computed_crc = crc32fast::hash(&buf[..total - CRC_SIZE]);
    if stored_crc != computed_crc {
        return Err(QueueError::ChecksumMismatch {
            expected: stored_crc,
            actual: computed_crc,
        });
    }

    Ok(Decoded::Frame {
        payload: buf[HEADER_SIZE..HEADER_SIZE + payload_len].to_vec(),
        consumed: total,
    })
}
