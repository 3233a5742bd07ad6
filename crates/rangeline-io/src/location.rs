//! Object URIs (`s3://bucket/key`, `gs://bucket/key`,
//! `azure://account/container/key`, `file:///dir/key` or a bare path).

use std::fmt;
use std::path::Path;

use percent_encoding::percent_decode_str;
use rangeline_core::error::{Error, Result};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub scheme: String,
    /// Storage account; only set for Azure.
    pub account: Option<String>,
    /// Bucket, container, or (for `file`) the parent directory.
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn parse(uri: &str) -> Result<Self> {
        let parsed = match Url::parse(uri) {
            Ok(u) => u,
            Err(url::ParseError::RelativeUrlWithoutBase) => return Self::local(Path::new(uri)),
            Err(e) => return Err(Error::Config(format!("malformed URI '{uri}': {e}"))),
        };

        match parsed.scheme() {
            "s3" | "gs" | "gcs" => {
                let bucket = parsed
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| Error::Config(format!("URI '{uri}' missing bucket")))?
                    .to_string();
                let key = decode_key(uri, parsed.path().trim_start_matches('/'))?;
                if key.is_empty() {
                    return Err(Error::Config(format!("URI '{uri}' missing object key")));
                }
                Ok(Self {
                    scheme: parsed.scheme().to_string(),
                    account: None,
                    bucket,
                    key,
                })
            }
            "azure" | "azblob" => {
                let account = parsed
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| Error::Config(format!("URI '{uri}' missing account")))?
                    .to_string();
                let mut segments = parsed.path().trim_start_matches('/').splitn(2, '/');
                let container = segments
                    .next()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| Error::Config(format!("URI '{uri}' missing container")))?
                    .to_string();
                let key = decode_key(uri, segments.next().unwrap_or(""))?;
                if key.is_empty() {
                    return Err(Error::Config(format!("URI '{uri}' missing object key")));
                }
                Ok(Self {
                    scheme: parsed.scheme().to_string(),
                    account: Some(account),
                    bucket: container,
                    key,
                })
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| Error::Config(format!("URI '{uri}' is not a local path")))?;
                Self::local(&path)
            }
            other => Err(Error::Config(format!("unsupported object scheme '{other}'"))),
        }
    }

    fn local(path: &Path) -> Result<Self> {
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("path '{}' has no file name", path.display())))?
            .to_string();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().to_string(),
            _ => ".".to_string(),
        };
        Ok(Self {
            scheme: "file".to_string(),
            account: None,
            bucket: dir,
            key,
        })
    }
}

/// `Url` keeps the path percent-encoded; object keys are stored raw.
fn decode_key(uri: &str, encoded: &str) -> Result<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|k| k.into_owned())
        .map_err(|_| Error::Config(format!("URI '{uri}' has a key that is not valid UTF-8")))
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.scheme.as_str(), &self.account) {
            ("file", _) => write!(f, "{}", Path::new(&self.bucket).join(&self.key).display()),
            (scheme, Some(account)) => {
                write!(f, "{scheme}://{account}/{}/{}", self.bucket, self.key)
            }
            (scheme, None) => write!(f, "{scheme}://{}/{}", self.bucket, self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_uri() {
        let loc = ObjectLocation::parse("s3://logs/2024/01/app.log").unwrap();
        assert_eq!(loc.scheme, "s3");
        assert_eq!(loc.bucket, "logs");
        assert_eq!(loc.key, "2024/01/app.log");
        assert_eq!(loc.to_string(), "s3://logs/2024/01/app.log");
    }

    #[test]
    fn parses_azure_uri() {
        let loc = ObjectLocation::parse("azure://acct/container/dir/blob.txt").unwrap();
        assert_eq!(loc.account.as_deref(), Some("acct"));
        assert_eq!(loc.bucket, "container");
        assert_eq!(loc.key, "dir/blob.txt");
    }

    #[test]
    fn parses_file_uri_and_bare_path() {
        let loc = ObjectLocation::parse("file:///tmp/data/input.txt").unwrap();
        assert_eq!(loc.scheme, "file");
        assert_eq!(loc.bucket, "/tmp/data");
        assert_eq!(loc.key, "input.txt");

        let bare = ObjectLocation::parse("input.txt").unwrap();
        assert_eq!(bare.bucket, ".");
        assert_eq!(bare.key, "input.txt");
    }

    #[test]
    fn keys_are_percent_decoded() {
        let loc = ObjectLocation::parse("s3://bucket/dir/my file.txt").unwrap();
        assert_eq!(loc.key, "dir/my file.txt");

        let loc = ObjectLocation::parse("gs://bucket/logs/caf%C3%A9%20%231.log").unwrap();
        assert_eq!(loc.key, "logs/caf\u{e9} #1.log");

        let loc = ObjectLocation::parse("azure://acct/container/a%2Bb/c d.txt").unwrap();
        assert_eq!(loc.bucket, "container");
        assert_eq!(loc.key, "a+b/c d.txt");
    }

    #[test]
    fn undecodable_key_is_config_error() {
        let err = ObjectLocation::parse("s3://bucket/bad%FF.txt").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_missing_key_and_unknown_scheme() {
        assert!(ObjectLocation::parse("s3://bucket-only").is_err());
        assert!(ObjectLocation::parse("azure://acct/container").is_err());
        let err = ObjectLocation::parse("ftp://example.com/file").unwrap_err();
        assert!(err.to_string().contains("unsupported object scheme"));
    }
}
