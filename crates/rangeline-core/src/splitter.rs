//! Delimiter carry state machine.
//!
//! Bytes arrive in arbitrary fragments (one per ranged fetch). The splitter
//! appends each fragment to its carry buffer and hands out every complete
//! delimited record it can find. Whatever follows the last delimiter stays in
//! the carry until more bytes arrive or the caller calls `finish`.
//!
//! A delimiter may straddle two fragments. When a scan finds no match, the
//! next scan restarts `delimiter.len() - 1` bytes before the old end of the
//! carry, so a partial match at the tail is picked up once the rest arrives.

use memchr::memmem::Finder;

use crate::delimiter::Delimiter;

/// A record as raw bytes, before text decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub bytes: Vec<u8>,
    /// Byte offset of the first byte of this record within the object.
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct RecordSplitter {
    delimiter: Delimiter,
    finder: Finder<'static>,
    carry: Vec<u8>,
    // carry[..start] has already been handed out; compacted on the next push.
    start: usize,
    // search resumes here; always >= start
    scan_from: usize,
    // object offset of carry[0]
    base: u64,
}

impl RecordSplitter {
    pub fn new(delimiter: Delimiter) -> Self {
        let finder = Finder::new(delimiter.as_bytes()).into_owned();
        Self {
            delimiter,
            finder,
            carry: Vec::new(),
            start: 0,
            scan_from: 0,
            base: 0,
        }
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Append freshly fetched bytes to the carry.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.start > 0 {
            self.carry.drain(..self.start);
            self.scan_from -= self.start;
            self.base += self.start as u64;
            self.start = 0;
        }
        self.carry.extend_from_slice(bytes);
    }

    /// Next complete record, or `None` when the carry holds no delimiter and
    /// more bytes are needed.
    pub fn next_record(&mut self) -> Option<RawRecord> {
        match self.finder.find(&self.carry[self.scan_from..]) {
            Some(pos) => {
                let end = self.scan_from + pos;
                let record = RawRecord {
                    bytes: self.carry[self.start..end].to_vec(),
                    offset: self.base + self.start as u64,
                };
                self.start = end + self.delimiter.len();
                self.scan_from = self.start;
                Some(record)
            }
            None => {
                let keep = self.delimiter.len() - 1;
                self.scan_from = self.carry.len().saturating_sub(keep).max(self.start);
                None
            }
        }
    }

    /// Take the trailing remainder (possibly empty) as the final record.
    pub fn finish(&mut self) -> RawRecord {
        let record = RawRecord {
            bytes: self.carry[self.start..].to_vec(),
            offset: self.base + self.start as u64,
        };
        self.clear();
        record
    }

    /// Drop any buffered bytes without producing a record.
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Bytes buffered but not yet part of a yielded record.
    pub fn carry_len(&self) -> usize {
        self.carry.len() - self.start
    }

    /// Object offset of the first byte not yet handed out.
    pub fn consumed(&self) -> u64 {
        self.base + self.start as u64
    }

    fn clear(&mut self) {
        self.base += self.carry.len() as u64;
        self.carry.clear();
        self.start = 0;
        self.scan_from = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(delim: &str) -> RecordSplitter {
        RecordSplitter::new(Delimiter::try_from(delim).unwrap())
    }

    fn drain(s: &mut RecordSplitter) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(r) = s.next_record() {
            out.push(String::from_utf8(r.bytes).unwrap());
        }
        out
    }

    #[test]
    fn splits_single_chunk() {
        let mut s = splitter("\n");
        s.push(b"a\nbb\nccc");
        assert_eq!(drain(&mut s), vec!["a", "bb"]);
        let tail = s.finish();
        assert_eq!(tail.bytes, b"ccc");
        assert_eq!(tail.offset, 5);
    }

    #[test]
    fn delimiter_straddles_fragments() {
        let mut s = splitter("\r\n");
        s.push(b"first\r");
        assert!(s.next_record().is_none());
        s.push(b"\nsecond");
        let rec = s.next_record().unwrap();
        assert_eq!(rec.bytes, b"first");
        assert!(s.next_record().is_none());
        assert_eq!(s.finish().bytes, b"second");
    }

    #[test]
    fn long_delimiter_split_one_byte_at_a_time() {
        let mut s = splitter("spoons");
        let mut records = Vec::new();
        for b in b"abcspoons123spoons" {
            s.push(std::slice::from_ref(b));
            records.extend(drain(&mut s));
        }
        assert_eq!(records, vec!["abc", "123"]);
        assert!(s.finish().bytes.is_empty());
    }

    #[test]
    fn consecutive_delimiters_produce_empty_records() {
        let mut s = splitter(",");
        s.push(b",,a,,");
        assert_eq!(drain(&mut s), vec!["", "", "a", ""]);
        assert!(s.finish().bytes.is_empty());
    }

    #[test]
    fn offsets_track_object_position_across_pushes() {
        let mut s = splitter("\n");
        s.push(b"ab\ncd");
        let first = s.next_record().unwrap();
        assert_eq!(first.offset, 0);
        assert!(s.next_record().is_none());
        assert_eq!(s.carry_len(), 2);
        s.push(b"e\nf");
        let second = s.next_record().unwrap();
        assert_eq!(second.bytes, b"cde");
        assert_eq!(second.offset, 3);
        assert_eq!(s.consumed(), 7);
        assert_eq!(s.finish().offset, 7);
    }

    #[test]
    fn reset_discards_carry() {
        let mut s = splitter("\n");
        s.push(b"partial");
        assert!(s.next_record().is_none());
        s.reset();
        assert_eq!(s.carry_len(), 0);
        assert!(s.finish().bytes.is_empty());
    }
}
