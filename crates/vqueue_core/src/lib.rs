//! # VQueue Core
//!
//! Durable, append-only queue engine.
//!
//! A [`Queue`] is bound once to a `(name, path)` identity and accepts
//! sequential pushes of raw byte values. Values are stored as checksummed,
//! length-prefixed frames in rotated segment files under `<path>/<name>/`;
//! on reopen, recovery reconstructs the durable write position and
//! truncates any torn tail write, so a crash never corrupts previously
//! committed frames.
//!
//! ```no_run
//! use vqueue_core::{FlushPolicy, Queue, QueueConfig};
//!
//! let config = QueueConfig::new().flush_policy(FlushPolicy::batched());
//! let queue = Queue::open_with_config("example_queue", "./data/out", config)?;
//! for i in 0..1_000_000u32 {
//!     queue.push(format!("tst_{i}").as_bytes())?;
//! }
//! queue.close()?;
//! # Ok::<(), vqueue_core::QueueError>(())
//! ```
//!
//! This crate provides:
//! - Frame codec: the self-describing on-disk record format
//! - Segment files with size-threshold rotation
//! - Write buffering with a configurable flush policy
//! - Crash recovery (torn-tail truncation) at configure time

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod dir;
pub mod error;
pub mod frame;
pub mod queue;
pub mod segment;
pub mod stats;

pub use config::{FlushPolicy, QueueConfig};
pub use error::{QueueError, QueueResult};
pub use queue::Queue;
pub use stats::{QueueStats, StatsSnapshot};
