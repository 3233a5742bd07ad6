use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rangeline_core::error::{StoreError, StoreResult};

use super::{ByteStream, RemoteObjectStore};

/// Local filesystem store. `bucket` is a directory and `key` a path
/// relative to it.
#[derive(Debug, Clone, Default)]
pub struct FsObjectStore;

impl FsObjectStore {
    pub fn new() -> Self {
        Self
    }

    fn path(bucket: &str, key: &str) -> PathBuf {
        Path::new(bucket).join(key)
    }
}

fn map_io(bucket: &str, key: &str, op: &str, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else {
        StoreError::Access(format!("{op}: {e}"))
    }
}

impl RemoteObjectStore for FsObjectStore {
    fn size(&self, bucket: &str, key: &str) -> StoreResult<u64> {
        let meta = fs::metadata(Self::path(bucket, key)).map_err(|e| map_io(bucket, key, "size", e))?;
        if !meta.is_file() {
            return Err(StoreError::Access(format!(
                "size: '{}' is not a regular file",
                Self::path(bucket, key).display()
            )));
        }
        Ok(meta.len())
    }

    fn fetch_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end_inclusive: u64,
    ) -> StoreResult<ByteStream> {
        let mut f = File::open(Self::path(bucket, key)).map_err(|e| map_io(bucket, key, "open", e))?;
        if end_inclusive < start {
            return Ok(Box::new(io::empty()));
        }
        f.seek(SeekFrom::Start(start))
            .map_err(|e| map_io(bucket, key, "seek", e))?;
        let len = (end_inclusive - start).saturating_add(1);
        Ok(Box::new(f.take(len)))
    }
}
