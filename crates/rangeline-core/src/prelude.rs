//! Convenient re-exports for downstream crates.

pub use crate::config::{ReaderConfig, StorageConfig};
pub use crate::delimiter::Delimiter;
pub use crate::error::{Error, Result, StoreError, StoreResult};
pub use crate::splitter::{RawRecord, RecordSplitter};
