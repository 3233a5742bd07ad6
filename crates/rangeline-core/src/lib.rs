#![forbid(unsafe_code)]
//! rangeline-core: configuration, errors, and the record splitter.
//!
//! The splitter here is a pure state machine over byte chunks. Fetching those
//! chunks from object storage is the job of `rangeline-io`, which owns the
//! `RemoteObjectStore` trait and the ranged reader built on top of it.

pub mod config;
pub mod delimiter;
pub mod error;
pub mod prelude;
pub mod splitter;

pub use config::{ReaderConfig, StorageConfig, DEFAULT_CHUNK_SIZE};
pub use delimiter::Delimiter;
pub use error::{Error, Result, StoreError, StoreResult};
pub use splitter::{RawRecord, RecordSplitter};
