//! Ranged record reader.
//!
//! Reads one object through a `RemoteObjectStore` in byte-inclusive ranges
//! `[cursor, min(cursor + chunk_size, total_size)]`, advancing the cursor one
//! past the requested upper bound after each fetch. Fetches are demand-driven:
//! the next range is requested only once the splitter has no complete record
//! left. Each range body is read fully and dropped before any record from it
//! is returned, so abandoning the sequence never leaves a stream open.

use std::io::Read;
use std::sync::Arc;

use rangeline_core::config::{ReaderConfig, DEFAULT_CHUNK_SIZE};
use rangeline_core::delimiter::Delimiter;
use rangeline_core::error::{Error, Result, StoreResult};
use rangeline_core::splitter::{RawRecord, RecordSplitter};

use crate::location::ObjectLocation;
use crate::store::{build_store_from_config, RemoteObjectStore};
use crate::telemetry;

/// Construction-time settings, validated before any store call.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub chunk_size: u64,
    pub delimiter: Delimiter,
    pub lossy_utf8: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: Delimiter::default(),
            lossy_utf8: false,
        }
    }
}

impl ReaderOptions {
    pub fn from_config(cfg: &ReaderConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            chunk_size: cfg.chunk_size,
            delimiter: cfg.delimiter()?,
            lossy_utf8: cfg.lossy_utf8,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    /// Byte offset of the record's first byte within the object.
    pub offset: u64,
    /// The trailing remainder after the last delimiter. It is still a record:
    /// dropping it loses the last line of an unterminated object.
    pub terminal: bool,
}

/// A step of the record sequence. `Done` is produced exactly once and
/// carries the terminal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Record(Record),
    Done(Record),
}

impl Step {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }

    pub fn into_record(self) -> Record {
        match self {
            Step::Record(r) | Step::Done(r) => r,
        }
    }
}

/// Progress snapshot for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// `None` until the first record is requested.
    pub total_size: Option<u64>,
    pub cursor: u64,
    pub fetches: u64,
    pub bytes_fetched: u64,
    /// Records produced so far, the terminal one included.
    pub records: u64,
}

/// Number of range requests a full pass over `total_size` bytes issues when
/// nothing comes back short. Each request covers `chunk_size + 1` bytes.
pub fn planned_fetches(total_size: u64, chunk_size: u64) -> u64 {
    if total_size == 0 {
        return 0;
    }
    let per_fetch = chunk_size.saturating_add(1);
    total_size / per_fetch + u64::from(total_size % per_fetch != 0)
}

/// Reader over one object. Its record sequence is created on the first
/// `records` call and shared by every later call.
pub struct RangedRecordReader {
    store: Arc<dyn RemoteObjectStore>,
    bucket: String,
    key: String,
    options: ReaderOptions,
    records: Option<Records>,
}

impl RangedRecordReader {
    pub fn new(
        store: Arc<dyn RemoteObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        options: ReaderOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
            options,
            records: None,
        })
    }

    pub fn from_config(
        store: Arc<dyn RemoteObjectStore>,
        location: &ObjectLocation,
        cfg: &ReaderConfig,
    ) -> Result<Self> {
        let options = ReaderOptions::from_config(cfg)?;
        Self::new(store, location.bucket.clone(), location.key.clone(), options)
    }

    /// Pick the adapter for `location`'s scheme and build a reader on it.
    pub fn open(location: &ObjectLocation, cfg: &ReaderConfig) -> Result<Self> {
        let options = ReaderOptions::from_config(cfg)?;
        let store = build_store_from_config(location, &cfg.storage)?;
        Self::new(store, location.bucket.clone(), location.key.clone(), options)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The record sequence for this reader.
    ///
    /// `delimiter` overrides the configured one for the whole pass. Once the
    /// sequence exists it is returned as-is; asking for a different
    /// delimiter at that point is a configuration error.
    pub fn records(&mut self, delimiter: Option<&str>) -> Result<&mut Records> {
        let requested = delimiter.map(Delimiter::try_from).transpose()?;
        if let (Some(existing), Some(req)) = (&self.records, &requested) {
            if existing.delimiter() != req {
                return Err(Error::Config(format!(
                    "record sequence already uses {:?}; cannot switch to {:?}",
                    existing.delimiter(),
                    req
                )));
            }
        }

        let store = &self.store;
        let bucket = &self.bucket;
        let key = &self.key;
        let options = &self.options;
        Ok(self.records.get_or_insert_with(|| {
            Records::new(
                Arc::clone(store),
                bucket.clone(),
                key.clone(),
                options.chunk_size,
                requested.unwrap_or_else(|| options.delimiter.clone()),
                options.lossy_utf8,
            )
        }))
    }

    pub fn stats(&self) -> ReadStats {
        self.records.as_ref().map(Records::stats).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Finished,
    Failed,
}

/// Single-pass, forward-only record sequence.
///
/// As an iterator it yields every record, the terminal one last with
/// `terminal == true`, and then `None`. After an error it yields `None`.
pub struct Records {
    store: Arc<dyn RemoteObjectStore>,
    bucket: String,
    key: String,
    chunk_size: u64,
    lossy_utf8: bool,
    splitter: RecordSplitter,
    total_size: Option<u64>,
    cursor: u64,
    state: State,
    fetches: u64,
    bytes_fetched: u64,
    records: u64,
}

impl Records {
    fn new(
        store: Arc<dyn RemoteObjectStore>,
        bucket: String,
        key: String,
        chunk_size: u64,
        delimiter: Delimiter,
        lossy_utf8: bool,
    ) -> Self {
        Self {
            store,
            bucket,
            key,
            chunk_size,
            lossy_utf8,
            splitter: RecordSplitter::new(delimiter),
            total_size: None,
            cursor: 0,
            state: State::Active,
            fetches: 0,
            bytes_fetched: 0,
            records: 0,
        }
    }

    pub fn delimiter(&self) -> &Delimiter {
        self.splitter.delimiter()
    }

    /// Next step, or `None` once `Done` has been returned or after an error.
    pub fn next_step(&mut self) -> Result<Option<Step>> {
        if self.state != State::Active {
            return Ok(None);
        }
        match self.advance() {
            Ok(step) => Ok(Some(step)),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    pub fn stats(&self) -> ReadStats {
        ReadStats {
            total_size: self.total_size,
            cursor: self.cursor,
            fetches: self.fetches,
            bytes_fetched: self.bytes_fetched,
            records: self.records,
        }
    }

    fn advance(&mut self) -> Result<Step> {
        let total = self.total_size()?;
        loop {
            if let Some(raw) = self.splitter.next_record() {
                let record = self.decode(raw, false)?;
                self.records += 1;
                return Ok(Step::Record(record));
            }
            if self.cursor >= total || !self.fetch_next(total)? {
                break;
            }
        }

        let tail = self.splitter.finish();
        let record = self.decode(tail, true)?;
        self.records += 1;
        self.state = State::Finished;
        telemetry::sequence_finished(&self.bucket, &self.key, &self.stats());
        Ok(Step::Done(record))
    }

    fn total_size(&mut self) -> Result<u64> {
        if let Some(total) = self.total_size {
            return Ok(total);
        }
        let total = self
            .store
            .size(&self.bucket, &self.key)
            .map_err(|e| Error::object_access(&self.bucket, &self.key, e))?;
        telemetry::size_resolved(&self.bucket, &self.key, total);
        self.total_size = Some(total);
        Ok(total)
    }

    /// Fetch the next range into the splitter. `false` means the store had
    /// nothing left, which ends the pass even if `cursor < total`.
    fn fetch_next(&mut self, total: u64) -> Result<bool> {
        let start = self.cursor;
        let end = start.saturating_add(self.chunk_size).min(total);
        let bytes = self
            .fetch(start, end, total)
            .map_err(|e| Error::object_access(&self.bucket, &self.key, e))?;

        self.cursor = end.saturating_add(1).min(total);
        self.fetches += 1;
        self.bytes_fetched += bytes.len() as u64;
        telemetry::range_fetched(&self.bucket, &self.key, start, end, bytes.len());

        if bytes.is_empty() {
            return Ok(false);
        }
        self.splitter.push(&bytes);
        Ok(true)
    }

    fn fetch(&self, start: u64, end: u64, total: u64) -> StoreResult<Vec<u8>> {
        let requested = end - start + 1;
        let stream = self.store.fetch_range(&self.bucket, &self.key, start, end)?;
        let mut buf = Vec::with_capacity(requested.min(total - start) as usize);
        stream.take(requested).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn decode(&self, raw: RawRecord, terminal: bool) -> Result<Record> {
        let offset = raw.offset;
        let text = if self.lossy_utf8 {
            String::from_utf8_lossy(&raw.bytes).into_owned()
        } else {
            String::from_utf8(raw.bytes).map_err(|_| Error::Decode { offset })?
        };
        Ok(Record {
            text,
            offset,
            terminal,
        })
    }

    fn fail(&mut self, err: &Error) {
        self.state = State::Failed;
        self.splitter.reset();
        telemetry::fetch_failed(&self.bucket, &self.key, self.cursor, err);
    }
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_step()
            .map(|step| step.map(Step::into_record))
            .transpose()
    }
}

impl std::iter::FusedIterator for Records {}
