use thiserror::Error;

/// Canonical result for rangeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Result returned by `RemoteObjectStore` implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Any failure talking to the object store. The record sequence is
    /// aborted where this surfaces; records already yielded stay valid.
    #[error("object access failed for '{bucket}/{key}': {source}")]
    ObjectAccess {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("record at byte offset {offset} is not valid UTF-8")]
    Decode { offset: u64 },
}

impl Error {
    pub fn object_access(bucket: &str, key: &str, source: StoreError) -> Self {
        Error::ObjectAccess {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        }
    }

    /// True for `ObjectAccess` errors whose store error is `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectAccess {
                source: StoreError::NotFound { .. },
                ..
            }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Errors raised by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("storage error: {0}")]
    Access(String),

    #[error("stream interrupted: {0}")]
    Io(#[from] std::io::Error),
}
