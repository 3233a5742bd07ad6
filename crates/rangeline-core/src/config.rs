//! Reader configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::delimiter::Delimiter;
use crate::error::{Error, Result};

/// Default maximum bytes requested per range fetch (128 KiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 131_072;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum bytes requested per range fetch. Must be positive.
    pub chunk_size: u64,

    /// Record delimiter, written with backslash escapes (`\n`, `\r\n`, ...).
    pub delimiter: String,

    /// Replace invalid UTF-8 with U+FFFD instead of failing the record.
    pub lossy_utf8: bool,

    /// Passed through to the storage adapter; not interpreted by the reader.
    pub storage: StorageConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: "\\n".to_string(),
            lossy_utf8: false,
            storage: StorageConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RANGELINE_CHUNK_SIZE`: bytes per range fetch
    /// - `RANGELINE_DELIMITER`: record delimiter (escaped, e.g. `\r\n`)
    /// - `RANGELINE_LOSSY_UTF8`: `true`/`false`
    ///
    /// plus the storage variables documented on [`StorageConfig::from_env`].
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RANGELINE_CHUNK_SIZE") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.chunk_size = v;
            }
        }

        if let Ok(s) = std::env::var("RANGELINE_DELIMITER") {
            cfg.delimiter = s;
        }

        if let Ok(s) = std::env::var("RANGELINE_LOSSY_UTF8") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.lossy_utf8 = v;
            }
        }

        cfg.storage = StorageConfig::from_env();
        cfg
    }

    /// Load a JSON config document. Missing fields take their defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        Ok(serde_json::from_str(doc)?)
    }

    /// Resolve the escaped delimiter string.
    pub fn delimiter(&self) -> Result<Delimiter> {
        Delimiter::parse_escaped(&self.delimiter)
    }

    /// Fail fast on settings the reader cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".into()));
        }
        self.delimiter()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    /// Custom S3-compatible endpoint (MinIO, R2, ...).
    pub aws_endpoint: Option<String>,
    pub gcs_service_account_path: Option<String>,
    pub azure_access_key: Option<String>,
    pub retry_max_retries: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            aws_endpoint: None,
            gcs_service_account_path: None,
            azure_access_key: None,
            retry_max_retries: 3,
            retry_initial_backoff_ms: 200,
            retry_max_backoff_ms: 5_000,
        }
    }
}

impl StorageConfig {
    /// Environment variables:
    /// - `RANGELINE_AWS_REGION`, `RANGELINE_AWS_ACCESS_KEY_ID`,
    ///   `RANGELINE_AWS_SECRET_ACCESS_KEY`, `RANGELINE_AWS_SESSION_TOKEN`,
    ///   `RANGELINE_AWS_ENDPOINT`
    /// - `RANGELINE_GCS_SA_PATH`
    /// - `RANGELINE_AZURE_ACCESS_KEY`
    /// - `RANGELINE_RETRY_MAX_RETRIES`, `RANGELINE_RETRY_INITIAL_MS`,
    ///   `RANGELINE_RETRY_MAX_MS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RANGELINE_AWS_REGION") {
            cfg.aws_region = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_AWS_ACCESS_KEY_ID") {
            cfg.aws_access_key_id = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_AWS_SECRET_ACCESS_KEY") {
            cfg.aws_secret_access_key = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_AWS_SESSION_TOKEN") {
            cfg.aws_session_token = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_AWS_ENDPOINT") {
            cfg.aws_endpoint = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_GCS_SA_PATH") {
            cfg.gcs_service_account_path = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_AZURE_ACCESS_KEY") {
            cfg.azure_access_key = Some(s);
        }

        if let Ok(s) = std::env::var("RANGELINE_RETRY_MAX_RETRIES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.retry_max_retries = v;
            }
        }

        if let Ok(s) = std::env::var("RANGELINE_RETRY_INITIAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_initial_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("RANGELINE_RETRY_MAX_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_max_backoff_ms = v;
            }
        }

        cfg
    }
}
