use std::collections::HashMap;
use std::future::Future;
use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::thread;

use bytes::{Buf, Bytes};
use futures::stream::BoxStream;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{BackoffConfig, Error as ObjectStoreError, GetOptions, ObjectStore};
use rangeline_core::config::StorageConfig;
use rangeline_core::error::{StoreError, StoreResult};
use tokio::runtime::Runtime;

#[cfg(feature = "s3")]
use object_store::aws::AmazonS3Builder;
#[cfg(feature = "azure")]
use object_store::azure::MicrosoftAzureBuilder;
#[cfg(feature = "gcs")]
use object_store::gcp::GoogleCloudStorageBuilder;

use super::{ByteStream, RemoteObjectStore, RetryConfig};
use crate::telemetry;

#[derive(Debug, thiserror::Error)]
pub enum CloudStoreBuilderError {
    #[error("failed to initialize async runtime: {0}")]
    Runtime(String),

    #[error("object_store builder error: {0}")]
    Builder(String),
}

impl From<CloudStoreBuilderError> for rangeline_core::error::Error {
    fn from(err: CloudStoreBuilderError) -> Self {
        rangeline_core::error::Error::Config(err.to_string())
    }
}

#[derive(Debug, Clone)]
enum Backend {
    #[cfg(feature = "s3")]
    S3,
    #[cfg(feature = "gcs")]
    Gcs,
    #[cfg(feature = "azure")]
    Azure { account: String },
    /// Clients registered up front with `with_client`; nothing to build.
    Prebuilt,
}

/// `RemoteObjectStore` over `object_store`, one client per bucket.
///
/// The async client runs on an owned tokio runtime and its body stream is
/// exposed as a blocking `Read`. Opening a request (HEAD, ranged GET) is
/// retried with backoff; bytes already streaming are not.
pub struct CloudObjectStore {
    runtime: Arc<Runtime>,
    backend: Backend,
    cfg: StorageConfig,
    retry: RetryConfig,
    clients: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
    // sizes seen through `size`, used to clamp the end of ranged GETs
    sizes: Mutex<HashMap<(String, String), u64>>,
}

impl CloudObjectStore {
    fn new(backend: Backend, cfg: &StorageConfig) -> Result<Self, CloudStoreBuilderError> {
        let runtime =
            Runtime::new().map_err(|e| CloudStoreBuilderError::Runtime(e.to_string()))?;
        Ok(Self {
            runtime: Arc::new(runtime),
            backend,
            cfg: cfg.clone(),
            retry: RetryConfig::from(cfg),
            clients: Mutex::new(HashMap::new()),
            sizes: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(feature = "s3")]
    pub fn s3(cfg: &StorageConfig) -> Result<Self, CloudStoreBuilderError> {
        Self::new(Backend::S3, cfg)
    }

    #[cfg(feature = "gcs")]
    pub fn gcs(cfg: &StorageConfig) -> Result<Self, CloudStoreBuilderError> {
        Self::new(Backend::Gcs, cfg)
    }

    #[cfg(feature = "azure")]
    pub fn azure(account: String, cfg: &StorageConfig) -> Result<Self, CloudStoreBuilderError> {
        Self::new(Backend::Azure { account }, cfg)
    }

    /// A store whose buckets are all registered through `with_client`.
    pub fn prebuilt(retry: RetryConfig) -> Result<Self, CloudStoreBuilderError> {
        let mut store = Self::new(Backend::Prebuilt, &StorageConfig::default())?;
        store.retry = retry;
        Ok(store)
    }

    /// Serve `bucket` from an already-built client.
    pub fn with_client(self, bucket: &str, client: Arc<dyn ObjectStore>) -> Self {
        lock(&self.clients).insert(bucket.to_string(), client);
        self
    }

    fn client(&self, bucket: &str) -> StoreResult<Arc<dyn ObjectStore>> {
        let mut clients = lock(&self.clients);
        if let Some(client) = clients.get(bucket) {
            return Ok(Arc::clone(client));
        }
        let client = self
            .build_client(bucket)
            .map_err(|e| StoreError::Access(e.to_string()))?;
        clients.insert(bucket.to_string(), Arc::clone(&client));
        Ok(client)
    }

    fn build_client(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, CloudStoreBuilderError> {
        let cfg = &self.cfg;
        match &self.backend {
            #[cfg(feature = "s3")]
            Backend::S3 => {
                let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
                if let Some(region) = &cfg.aws_region {
                    builder = builder.with_region(region.clone());
                }
                if let Some(access_key) = &cfg.aws_access_key_id {
                    builder = builder.with_access_key_id(access_key.clone());
                }
                if let Some(secret_key) = &cfg.aws_secret_access_key {
                    builder = builder.with_secret_access_key(secret_key.clone());
                }
                if let Some(token) = &cfg.aws_session_token {
                    builder = builder.with_token(token.clone());
                }
                if let Some(endpoint) = &cfg.aws_endpoint {
                    builder = builder
                        .with_endpoint(endpoint.clone())
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                let store = builder
                    .with_retry(object_store_retry(&self.retry))
                    .build()
                    .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
                Ok(Arc::new(store))
            }
            #[cfg(feature = "gcs")]
            Backend::Gcs => {
                let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
                if let Some(sa_path) = &cfg.gcs_service_account_path {
                    builder = builder.with_service_account_path(sa_path);
                }
                let store = builder
                    .with_retry(object_store_retry(&self.retry))
                    .build()
                    .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
                Ok(Arc::new(store))
            }
            #[cfg(feature = "azure")]
            Backend::Azure { account } => {
                let mut builder = MicrosoftAzureBuilder::new()
                    .with_account(account.clone())
                    .with_container_name(bucket)
                    .with_retry(object_store_retry(&self.retry));
                if let Some(key) = &cfg.azure_access_key {
                    builder = builder.with_access_key(key.clone());
                }
                let store = builder
                    .build()
                    .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
                Ok(Arc::new(store))
            }
            Backend::Prebuilt => {
                let _ = cfg;
                Err(CloudStoreBuilderError::Builder(format!(
                    "no client registered for bucket '{bucket}'"
                )))
            }
        }
    }

    fn run_with_retry<F, Fut, T>(&self, op_name: &str, bucket: &str, key: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = object_store::Result<T>>,
    {
        let mut attempt = 0usize;
        let mut backoff = self.retry.initial_backoff;

        loop {
            match self.runtime.block_on(op()) {
                Ok(value) => return Ok(value),
                Err(ObjectStoreError::NotFound { .. }) => {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    })
                }
                Err(err) => {
                    if attempt >= self.retry.max_retries || !is_retryable(&err) {
                        return Err(StoreError::Access(format!("{op_name}: {err}")));
                    }
                    attempt += 1;
                    telemetry::retrying(op_name, attempt, backoff, &err);
                    thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, self.retry.max_backoff);
                }
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

fn is_retryable(err: &ObjectStoreError) -> bool {
    !matches!(
        err,
        ObjectStoreError::NotFound { .. }
            | ObjectStoreError::AlreadyExists { .. }
            | ObjectStoreError::InvalidPath { .. }
            | ObjectStoreError::NotSupported { .. }
            | ObjectStoreError::NotImplemented
            | ObjectStoreError::UnknownConfigurationKey { .. }
    )
}

fn object_store_retry(retry: &RetryConfig) -> object_store::RetryConfig {
    object_store::RetryConfig {
        max_retries: retry.max_retries,
        retry_timeout: retry.max_backoff,
        backoff: BackoffConfig {
            init_backoff: retry.initial_backoff,
            max_backoff: retry.max_backoff,
            base: 2.0,
        },
    }
}

impl RemoteObjectStore for CloudObjectStore {
    fn size(&self, bucket: &str, key: &str) -> StoreResult<u64> {
        let client = self.client(bucket)?;
        let path = ObjectPath::from(key);
        let meta = self.run_with_retry("head", bucket, key, || {
            let client = Arc::clone(&client);
            let path = path.clone();
            async move { client.head(&path).await }
        })?;
        let size = meta.size as u64;
        lock(&self.sizes).insert((bucket.to_string(), key.to_string()), size);
        Ok(size)
    }

    fn fetch_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end_inclusive: u64,
    ) -> StoreResult<ByteStream> {
        let mut end_exclusive = end_inclusive.saturating_add(1);
        if let Some(size) = lock(&self.sizes).get(&(bucket.to_string(), key.to_string())) {
            end_exclusive = end_exclusive.min(*size);
        }
        if start >= end_exclusive {
            return Ok(Box::new(io::empty()));
        }

        let client = self.client(bucket)?;
        let path = ObjectPath::from(key);
        let range = (start as usize)..(end_exclusive as usize);
        let result = self.run_with_retry("get_range", bucket, key, || {
            let client = Arc::clone(&client);
            let path = path.clone();
            let options = GetOptions {
                range: Some(range.clone()),
                ..Default::default()
            };
            async move { client.get_opts(&path, options).await }
        })?;

        Ok(Box::new(BlockingByteStream {
            runtime: Arc::clone(&self.runtime),
            stream: result.into_stream(),
            current: Bytes::new(),
        }))
    }
}

/// Drives an async body stream from synchronous `Read` calls.
struct BlockingByteStream {
    runtime: Arc<Runtime>,
    stream: BoxStream<'static, object_store::Result<Bytes>>,
    current: Bytes,
}

impl Read for BlockingByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.runtime.block_on(self.stream.next()) {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(io::Error::new(io::ErrorKind::Other, e)),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    fn store_with(bucket: &str, key: &str, body: &'static [u8]) -> CloudObjectStore {
        let mem = InMemory::new();
        let rt = Runtime::new().unwrap();
        rt.block_on(mem.put(&ObjectPath::from(key), Bytes::from_static(body)))
            .unwrap();
        CloudObjectStore::prebuilt(RetryConfig::default())
            .unwrap()
            .with_client(bucket, Arc::new(mem))
    }

    #[test]
    fn size_and_inclusive_range() {
        let store = store_with("bucket", "dir/obj.txt", b"hello world");
        assert_eq!(store.size("bucket", "dir/obj.txt").unwrap(), 11);

        let mut out = Vec::new();
        store
            .fetch_range("bucket", "dir/obj.txt", 6, 11)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"world");
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = store_with("bucket", "a", b"x");
        assert!(matches!(
            store.size("bucket", "b"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn unregistered_bucket_is_access_error() {
        let store = store_with("bucket", "a", b"x");
        assert!(matches!(
            store.size("other", "a"),
            Err(StoreError::Access(_))
        ));
    }
}
