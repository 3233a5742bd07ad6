//! Object-store adapters implementing `RemoteObjectStore`.
//!
//! - `memory`: in-process map, used by tests and benches.
//! - `fs`: local filesystem (default for `file://` and bare paths).
//! - `cloud`: S3/GCS/Azure built on top of `object_store` (feature-gated).
//!
//! Also exposes `RetryConfig` and a builder that picks the adapter for a
//! location's URI scheme.

mod fs;
mod memory;
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

#[cfg(any(feature = "s3", feature = "gcs", feature = "azure"))]
mod cloud;
#[cfg(any(feature = "s3", feature = "gcs", feature = "azure"))]
pub use cloud::{CloudObjectStore, CloudStoreBuilderError};

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use rangeline_core::config::StorageConfig;
use rangeline_core::error::{Error, Result, StoreResult};

use crate::location::ObjectLocation;

/// Readable body of a ranged fetch. Dropping it releases the underlying
/// file handle or HTTP connection.
pub type ByteStream = Box<dyn Read + Send>;

/// The two calls the ranged reader needs from object storage.
pub trait RemoteObjectStore: Send + Sync {
    /// Object length in bytes.
    fn size(&self, bucket: &str, key: &str) -> StoreResult<u64>;

    /// Bytes `[start, end_inclusive]`. An end past the object is clamped by
    /// the backend; a start past the object yields an empty stream.
    fn fetch_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end_inclusive: u64,
    ) -> StoreResult<ByteStream>;
}

/// Retry/backoff configuration shared across cloud adapters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl From<&StorageConfig> for RetryConfig {
    fn from(cfg: &StorageConfig) -> Self {
        Self {
            max_retries: cfg.retry_max_retries,
            initial_backoff: Duration::from_millis(cfg.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.retry_max_backoff_ms),
        }
    }
}

/// Build the storage backend that serves `location`.
pub fn build_store_from_config(
    location: &ObjectLocation,
    cfg: &StorageConfig,
) -> Result<Arc<dyn RemoteObjectStore>> {
    match location.scheme.as_str() {
        "file" => Ok(Arc::new(FsObjectStore::new())),
        "s3" => {
            #[cfg(feature = "s3")]
            {
                Ok(Arc::new(CloudObjectStore::s3(cfg)?))
            }

            #[cfg(not(feature = "s3"))]
            {
                let _ = cfg;
                Err(Error::Config(
                    "rangeline was built without the `s3` feature; rebuild with `--features rangeline-io/s3`"
                        .into(),
                ))
            }
        }
        "gs" | "gcs" => {
            #[cfg(feature = "gcs")]
            {
                Ok(Arc::new(CloudObjectStore::gcs(cfg)?))
            }

            #[cfg(not(feature = "gcs"))]
            {
                let _ = cfg;
                Err(Error::Config(
                    "rangeline was built without the `gcs` feature; rebuild with `--features rangeline-io/gcs`"
                        .into(),
                ))
            }
        }
        "azure" | "azblob" => {
            #[cfg(feature = "azure")]
            {
                let account = location.account.clone().ok_or_else(|| {
                    Error::Config(format!("location '{location}' missing Azure account"))
                })?;
                Ok(Arc::new(CloudObjectStore::azure(account, cfg)?))
            }

            #[cfg(not(feature = "azure"))]
            {
                let _ = cfg;
                Err(Error::Config(
                    "rangeline was built without the `azure` feature; rebuild with `--features rangeline-io/azure`"
                        .into(),
                ))
            }
        }
        other => Err(Error::Config(format!("unsupported object scheme '{other}'"))),
    }
}
