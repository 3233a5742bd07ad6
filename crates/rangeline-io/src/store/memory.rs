//! In-memory object store for tests and benches.
//!
//! Objects are keyed by `(bucket, key)`. Every range request is logged so
//! callers can assert on the exact ranges a reader issued.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use rangeline_core::error::{StoreError, StoreResult};

use super::{ByteStream, RemoteObjectStore};

#[derive(Default)]
struct Inner {
    objects: HashMap<(String, String), Arc<Vec<u8>>>,
    fetches: Vec<(u64, u64)>,
    size_calls: usize,
}

/// Thread-safe in-memory store; clones share the same objects.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one object (replacing any previous content).
    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), Arc::new(bytes.into()));
    }

    /// Ranges requested so far, as `(start, end_inclusive)`.
    pub fn fetch_log(&self) -> Vec<(u64, u64)> {
        self.lock().fetches.clone()
    }

    /// Number of `size` calls served.
    pub fn size_calls(&self) -> usize {
        self.lock().size_calls
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still consistent: every mutation is a single insert/push.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn object(&self, inner: &Inner, bucket: &str, key: &str) -> StoreResult<Arc<Vec<u8>>> {
        inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

impl RemoteObjectStore for MemoryObjectStore {
    fn size(&self, bucket: &str, key: &str) -> StoreResult<u64> {
        let mut inner = self.lock();
        inner.size_calls += 1;
        let bytes = self.object(&inner, bucket, key)?;
        Ok(bytes.len() as u64)
    }

    fn fetch_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end_inclusive: u64,
    ) -> StoreResult<ByteStream> {
        let mut inner = self.lock();
        inner.fetches.push((start, end_inclusive));
        let bytes = self.object(&inner, bucket, key)?;

        let len = bytes.len() as u64;
        if start >= len || end_inclusive < start {
            return Ok(Box::new(Cursor::new(Vec::new())));
        }
        let end = end_inclusive.min(len - 1);
        let slice = bytes[start as usize..=end as usize].to_vec();
        Ok(Box::new(Cursor::new(slice)))
    }
}
