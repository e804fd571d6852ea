// src/core/storage/data_types.rs

//! Defines the core data structures for storing values in the keyspace,
//! such as `StoredValue` and the `DataValue` enum.

use crate::core::storage::stream::Stream;
use crate::core::storage::zset::SortedSet;
use bytes::Bytes;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The tagged union over all value kinds a key can hold.
/// A key maps to exactly one kind; cross-kind access is a `WRONGTYPE` error.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    String(Bytes),
    List(VecDeque<Bytes>),
    SortedSet(SortedSet),
    Stream(Stream),
}

impl DataValue {
    /// The type name reported by the `TYPE` command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::List(_) => "list",
            DataValue::SortedSet(_) => "zset",
            DataValue::Stream(_) => "stream",
        }
    }
}

/// A wrapper for all values stored in the keyspace: the data plus its
/// optional absolute expiration timestamp in wall-clock milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub data: DataValue,
    pub expiry: Option<u64>,
}

impl StoredValue {
    /// Creates a new `StoredValue` without an expiry.
    pub fn new(data: DataValue) -> Self {
        Self { data, expiry: None }
    }

    /// Creates a new `StoredValue` with an optional absolute expiry in ms.
    pub fn with_expiry(data: DataValue, expiry: Option<u64>) -> Self {
        Self { data, expiry }
    }

    /// Checks whether the value is expired at the given instant.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiry.is_some_and(|expiry| now >= expiry)
    }

    /// Checks whether the value is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }
}
