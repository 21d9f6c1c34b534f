//! # VQueue Storage
//!
//! Storage backend trait and implementations for VQueue.
//!
//! This crate provides the lowest-level storage abstraction for the queue
//! engine. Storage backends are **opaque byte stores** - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (read, append, sync, truncate)
//! - No knowledge of frame formats or segment layout
//! - Must be `Send + Sync`; the engine owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and recovery simulation
//! - [`FileBackend`] - For persistent segment files
//!
//! ## Example
//!
//! ```rust
//! use vqueue_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
