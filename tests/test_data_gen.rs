//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rangeline_core::delimiter::Delimiter;
use rangeline_io::{MemoryObjectStore, RangedRecordReader, ReaderOptions, Record};

pub const BUCKET: &str = "test-bucket";
pub const KEY: &str = "objects/input.txt";

/// Deterministic pseudo-random text over a small alphabet that includes
/// every byte of `delimiter`, so delimiters (and partial ones) show up often.
pub fn generate_content(seed: u64, len: usize, delimiter: &str) -> String {
    let mut alphabet: Vec<char> = "abc xyz".chars().collect();
    alphabet.extend(delimiter.chars());
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let idx = (state >> 33) as usize % alphabet.len();
        out.push(alphabet[idx]);
        if state % 7 == 0 {
            out.push_str(delimiter);
        }
    }
    out
}

pub fn store_with(content: &[u8]) -> MemoryObjectStore {
    let store = MemoryObjectStore::new();
    store.insert(BUCKET, KEY, content.to_vec());
    store
}

pub fn reader_for(store: &MemoryObjectStore, chunk_size: u64, delimiter: &str) -> RangedRecordReader {
    let options = ReaderOptions {
        chunk_size,
        delimiter: Delimiter::try_from(delimiter).expect("valid delimiter"),
        lossy_utf8: false,
    };
    RangedRecordReader::new(Arc::new(store.clone()), BUCKET, KEY, options).expect("reader")
}

/// Delimited records and the terminal value for one full pass.
pub fn split_all(content: &str, chunk_size: u64, delimiter: &str) -> (Vec<String>, String) {
    let store = store_with(content.as_bytes());
    let mut reader = reader_for(&store, chunk_size, delimiter);
    let records: Vec<Record> = reader
        .records(None)
        .expect("records")
        .collect::<Result<_, _>>()
        .expect("pass succeeds");

    let (last, rest) = records.split_last().expect("terminal record");
    assert!(last.terminal, "last record must be terminal");
    assert!(rest.iter().all(|r| !r.terminal), "only the last record is terminal");
    (
        rest.iter().map(|r| r.text.clone()).collect(),
        last.text.clone(),
    )
}
