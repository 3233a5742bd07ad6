//! Record delimiter: a non-empty byte sequence.

use std::fmt;

use crate::error::{Error, Result};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(Vec<u8>);

impl Delimiter {
    /// Build a delimiter from raw bytes. Empty input is a configuration error.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::Config("delimiter must not be empty".into()));
        }
        Ok(Self(bytes))
    }

    /// Parse a delimiter written with backslash escapes (`\n`, `\r`, `\t`,
    /// `\0`, `\\`). Used for values that come from flags or env vars.
    pub fn parse_escaped(s: &str) -> Result<Self> {
        let mut out = Vec::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            match chars.next() {
                Some('n') => out.push(b'\n'),
                Some('r') => out.push(b'\r'),
                Some('t') => out.push(b'\t'),
                Some('0') => out.push(0),
                Some('\\') => out.push(b'\\'),
                Some(other) => {
                    return Err(Error::Config(format!(
                        "unsupported escape '\\{other}' in delimiter"
                    )))
                }
                None => {
                    return Err(Error::Config(
                        "delimiter ends with a dangling backslash".into(),
                    ))
                }
            }
        }
        Self::new(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Delimiters are never empty, so this is always false.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self(vec![b'\n'])
    }
}

impl TryFrom<&str> for Delimiter {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

impl fmt::Debug for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delimiter({:?})", String::from_utf8_lossy(&self.0))
    }
}
