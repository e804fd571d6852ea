// src/core/storage/stream.rs

//! The stream engine: an ordered log of entries keyed by monotonically
//! increasing `(ms, seq)` ids, with auto-assignment of `*` and `ms-*` forms.

use crate::core::CitrineError;
use crate::core::storage::data_types::now_ms;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// --- Stream ID ---

/// A stream entry id. Ordering is lexicographic on `(ms, seq)`, which the
/// derived `Ord` provides given the field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    pub fn is_zero(&self) -> bool {
        self.ms == 0 && self.seq == 0
    }
}

impl FromStr for StreamId {
    type Err = CitrineError;

    /// Parses `ms` (sequence defaults to 0) or `ms-seq`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            None => {
                let ms = s.parse().map_err(|_| CitrineError::InvalidStreamId)?;
                Ok(StreamId::new(ms, 0))
            }
            Some((ms, seq)) => {
                let ms = ms.parse().map_err(|_| CitrineError::InvalidStreamId)?;
                let seq = seq.parse().map_err(|_| CitrineError::InvalidStreamId)?;
                Ok(StreamId::new(ms, seq))
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// The id argument accepted by `XADD`: fully implicit `*`, partial `ms-*`,
/// or fully explicit `ms-seq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSpec {
    Auto,
    AutoSeq(u64),
    Explicit(StreamId),
}

impl FromStr for IdSpec {
    type Err = CitrineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(IdSpec::Auto);
        }
        match s.split_once('-') {
            Some((ms, "*")) => {
                let ms = ms.parse().map_err(|_| CitrineError::InvalidStreamId)?;
                Ok(IdSpec::AutoSeq(ms))
            }
            _ => Ok(IdSpec::Explicit(s.parse()?)),
        }
    }
}

// --- Stream Entry ---

/// A single entry: an id plus an insertion-ordered field/value mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: IndexMap<Bytes, Bytes>,
}

// --- Main Stream Struct ---

/// An append-only log of entries with strictly increasing ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    pub entries: BTreeMap<StreamId, StreamEntry>,
    /// The highest id ever assigned. `0-0` until the first entry.
    pub last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an id spec against the current stream state, validates it and
    /// appends the entry. Returns the assigned id.
    ///
    /// Auto-assignment rules:
    /// - `ms-*`: seq is `last.seq + 1` if `ms == last.ms`, else 0; a first
    ///   entry at `ms == 0` gets seq 1 so `0-0` is never produced.
    /// - `*`: `ms = max(now_ms, last.ms)`, seq as above.
    pub fn add_entry(
        &mut self,
        spec: IdSpec,
        fields: IndexMap<Bytes, Bytes>,
    ) -> Result<StreamId, CitrineError> {
        let id = match spec {
            IdSpec::Explicit(id) => id,
            IdSpec::AutoSeq(ms) => StreamId::new(ms, self.next_seq_for(ms)),
            IdSpec::Auto => {
                let ms = now_ms().max(self.last_id.ms);
                StreamId::new(ms, self.next_seq_for(ms))
            }
        };

        if id.is_zero() {
            return Err(CitrineError::StreamIdZero);
        }
        if id <= self.last_id {
            return Err(CitrineError::StreamIdTooSmall);
        }

        self.entries.insert(id, StreamEntry { id, fields });
        self.last_id = id;
        Ok(id)
    }

    fn next_seq_for(&self, ms: u64) -> u64 {
        if ms == self.last_id.ms && !self.is_empty() {
            self.last_id.seq + 1
        } else if ms == 0 {
            // A first entry at ms 0 must not collide with the forbidden 0-0.
            1
        } else {
            0
        }
    }

    /// All entries with `start <= id <= end`, in id order.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<&StreamEntry> {
        if start > end {
            return Vec::new();
        }
        self.entries.range(start..=end).map(|(_, e)| e).collect()
    }

    /// All entries with `id > after`, in id order. Used by `XREAD`.
    pub fn entries_after(&self, after: StreamId) -> Vec<&StreamEntry> {
        use std::ops::Bound;
        self.entries
            .range((Bound::Excluded(after), Bound::Unbounded))
            .map(|(_, e)| e)
            .collect()
    }
}
