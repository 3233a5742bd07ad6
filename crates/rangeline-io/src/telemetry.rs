//! Tracing hooks (feature: `tracing`).
//!
//! Every hook compiles to nothing without the feature. The binary layer
//! decides where events go by installing a subscriber.

use std::fmt::Display;
use std::time::Duration;

use crate::reader::ReadStats;

#[cfg(feature = "tracing")]
pub fn size_resolved(bucket: &str, key: &str, size: u64) {
    tracing::debug!(%bucket, %key, size, "resolved object size");
}

#[cfg(not(feature = "tracing"))]
pub fn size_resolved(_bucket: &str, _key: &str, _size: u64) {}

#[cfg(feature = "tracing")]
pub fn range_fetched(bucket: &str, key: &str, start: u64, end_inclusive: u64, bytes: usize) {
    tracing::trace!(%bucket, %key, start, end_inclusive, bytes, "fetched range");
}

#[cfg(not(feature = "tracing"))]
pub fn range_fetched(_bucket: &str, _key: &str, _start: u64, _end_inclusive: u64, _bytes: usize) {}

#[cfg(feature = "tracing")]
pub fn fetch_failed(bucket: &str, key: &str, cursor: u64, err: &dyn Display) {
    tracing::warn!(%bucket, %key, cursor, error = %err, "object access failed; aborting record sequence");
}

#[cfg(not(feature = "tracing"))]
pub fn fetch_failed(_bucket: &str, _key: &str, _cursor: u64, _err: &dyn Display) {}

#[cfg(feature = "tracing")]
pub fn sequence_finished(bucket: &str, key: &str, stats: &ReadStats) {
    tracing::debug!(
        %bucket,
        %key,
        total_size = stats.total_size.unwrap_or(0),
        fetches = stats.fetches,
        bytes_fetched = stats.bytes_fetched,
        records = stats.records,
        "record sequence finished"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn sequence_finished(_bucket: &str, _key: &str, _stats: &ReadStats) {}

#[cfg(feature = "tracing")]
pub fn retrying(op: &str, attempt: usize, backoff: Duration, err: &dyn Display) {
    tracing::debug!(%op, attempt, backoff_ms = backoff.as_millis() as u64, error = %err, "retrying storage request");
}

#[cfg(not(feature = "tracing"))]
pub fn retrying(_op: &str, _attempt: usize, _backoff: Duration, _err: &dyn Display) {}
