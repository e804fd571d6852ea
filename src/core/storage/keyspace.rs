// src/core/storage/keyspace.rs

//! The process-wide keyspace: a coarse-grained, mutex-guarded map from key to
//! tagged value with lazy expiration.
//!
//! Every typed accessor takes the single global mutex for the duration of the
//! operation. The guard is never held across an await point; blocking
//! commands and producers that need lock-coupled sequences use `lock()`
//! together with the `live_entry_mut` helper.

use crate::core::CitrineError;
use crate::core::storage::data_types::{DataValue, StoredValue, now_ms};
use crate::core::storage::zset::SortedSet;
use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, VecDeque};

/// The shared key-to-value store.
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: Mutex<HashMap<Bytes, StoredValue>>,
}

/// Normalises LRANGE/ZRANGE-style inclusive indices against a length.
/// Returns `None` when the normalised range is empty.
pub fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = if start < 0 { start + len } else { start };
    let mut end = if end < 0 { end + len } else { end };
    if start > end || start >= len {
        return None;
    }
    if end >= len {
        end = len - 1;
    }
    if start < 0 {
        start = 0;
    }
    // An end that is still negative lies before the first element.
    if end < 0 {
        return None;
    }
    Some((start as usize, end as usize))
}

impl Keyspace {
    pub fn new() -> Self {
        Default::default()
    }

    /// Seeds the keyspace from loaded snapshot contents.
    pub fn from_entries(entries: HashMap<Bytes, StoredValue>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Acquires the global keyspace mutex. For callers that need to couple
    /// several steps under one critical section (blocking fast paths,
    /// push-side waiter handoff).
    pub fn lock(&self) -> MutexGuard<'_, HashMap<Bytes, StoredValue>> {
        self.entries.lock()
    }

    /// Looks up a key with lazy expiration: an entry whose expiry has passed
    /// is removed on the spot and reported as missing.
    pub fn live_entry_mut<'a>(
        entries: &'a mut HashMap<Bytes, StoredValue>,
        key: &Bytes,
    ) -> Option<&'a mut StoredValue> {
        let now = now_ms();
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
            return None;
        }
        entries.get_mut(key)
    }

    // --- String operations ---

    /// `GET`: the string value, `None` if missing or expired.
    pub fn get_string(&self, key: &Bytes) -> Result<Option<Bytes>, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => Ok(None),
            Some(entry) => match &entry.data {
                DataValue::String(s) => Ok(Some(s.clone())),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// `SET`: stores a string, replacing any previous value and its expiry.
    pub fn set_string(&self, key: Bytes, value: Bytes, expiry: Option<u64>) {
        let mut entries = self.entries.lock();
        entries.insert(key, StoredValue::with_expiry(DataValue::String(value), expiry));
    }

    /// `INCR`: a missing key is created as "1"; a string that parses as a
    /// 64-bit signed integer is incremented; anything else is an error.
    pub fn incr(&self, key: &Bytes) -> Result<i64, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => {
                entries.insert(key.clone(), StoredValue::new(DataValue::String("1".into())));
                Ok(1)
            }
            Some(entry) => match &mut entry.data {
                DataValue::String(s) => {
                    let current: i64 = std::str::from_utf8(s)
                        .map_err(|_| CitrineError::NotAnInteger)?
                        .parse()
                        .map_err(|_| CitrineError::NotAnInteger)?;
                    let new_val = current.checked_add(1).ok_or(CitrineError::NotAnInteger)?;
                    *s = Bytes::from(new_val.to_string());
                    Ok(new_val)
                }
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    // --- List operations ---

    /// `LLEN`: 0 for a missing key.
    pub fn list_len(&self, key: &Bytes) -> Result<usize, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => Ok(0),
            Some(entry) => match &entry.data {
                DataValue::List(list) => Ok(list.len()),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// `LRANGE`: inclusive range with negative-index normalisation.
    pub fn list_range(
        &self,
        key: &Bytes,
        start: i64,
        end: i64,
    ) -> Result<Vec<Bytes>, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => Ok(Vec::new()),
            Some(entry) => match &entry.data {
                DataValue::List(list) => {
                    let Some((start, end)) = normalize_range(start, end, list.len()) else {
                        return Ok(Vec::new());
                    };
                    Ok(list.iter().skip(start).take(end - start + 1).cloned().collect())
                }
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// `LPOP`: removes and returns up to `count` head elements. The key is
    /// removed once the list drains. A missing key yields an empty vec.
    pub fn list_pop_front(&self, key: &Bytes, count: usize) -> Result<Vec<Bytes>, CitrineError> {
        let mut entries = self.entries.lock();
        let popped = match Self::live_entry_mut(&mut entries, key) {
            None => Vec::new(),
            Some(entry) => match &mut entry.data {
                DataValue::List(list) => {
                    let n = count.min(list.len());
                    list.drain(..n).collect()
                }
                _ => return Err(CitrineError::WrongType),
            },
        };
        Self::drop_if_empty_list(&mut entries, key);
        Ok(popped)
    }

    /// Removes a list key whose sequence has become empty, upholding the
    /// `key in keyspace ⇔ len(list) > 0` invariant.
    pub fn drop_if_empty_list(entries: &mut HashMap<Bytes, StoredValue>, key: &Bytes) {
        if entries
            .get(key)
            .is_some_and(|e| matches!(&e.data, DataValue::List(l) if l.is_empty()))
        {
            entries.remove(key);
        }
    }

    /// Resolves the list stored at `key` inside an already-held guard,
    /// creating an empty one on demand. Used by the push commands so that
    /// append, length computation and waiter handoff share one critical
    /// section.
    pub fn list_entry_mut<'a>(
        entries: &'a mut HashMap<Bytes, StoredValue>,
        key: &Bytes,
    ) -> Result<&'a mut VecDeque<Bytes>, CitrineError> {
        if Self::live_entry_mut(entries, key).is_none() {
            entries.insert(
                key.clone(),
                StoredValue::new(DataValue::List(VecDeque::new())),
            );
        }
        match entries.get_mut(key).map(|e| &mut e.data) {
            Some(DataValue::List(list)) => Ok(list),
            Some(_) => Err(CitrineError::WrongType),
            None => Err(CitrineError::Internal("list vanished under lock".into())),
        }
    }

    // --- Sorted-set operations ---

    /// `ZADD` (single pair): returns `true` iff the member was newly added.
    pub fn zadd(&self, key: &Bytes, member: Bytes, score: f64) -> Result<bool, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => {
                let mut zset = SortedSet::new();
                zset.add(member, score);
                entries.insert(key.clone(), StoredValue::new(DataValue::SortedSet(zset)));
                Ok(true)
            }
            Some(entry) => match &mut entry.data {
                DataValue::SortedSet(zset) => Ok(zset.add(member, score)),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// `ZRANK`: 0-based index in `(score, member)` order, `None` if absent.
    pub fn zrank(&self, key: &Bytes, member: &Bytes) -> Result<Option<usize>, CitrineError> {
        self.with_zset(key, |zset| zset.and_then(|z| z.rank(member)))
    }

    /// `ZRANGE`: members of the ordered set, LRANGE-style index rules.
    pub fn zrange(&self, key: &Bytes, start: i64, end: i64) -> Result<Vec<Bytes>, CitrineError> {
        self.with_zset(key, |zset| {
            let Some(zset) = zset else { return Vec::new() };
            let members = zset.sorted_members();
            match normalize_range(start, end, members.len()) {
                Some((start, end)) => members[start..=end].to_vec(),
                None => Vec::new(),
            }
        })
    }

    /// `ZSCORE`: the member's score, `None` if key or member is absent.
    pub fn zscore(&self, key: &Bytes, member: &Bytes) -> Result<Option<f64>, CitrineError> {
        self.with_zset(key, |zset| zset.and_then(|z| z.score(member)))
    }

    /// `ZCARD`: 0 for a missing key.
    pub fn zcard(&self, key: &Bytes) -> Result<usize, CitrineError> {
        self.with_zset(key, |zset| zset.map_or(0, |z| z.len()))
    }

    /// `ZREM` (single member): removes the key when the set empties.
    pub fn zrem(&self, key: &Bytes, member: &Bytes) -> Result<bool, CitrineError> {
        let mut entries = self.entries.lock();
        let removed = match Self::live_entry_mut(&mut entries, key) {
            None => false,
            Some(entry) => match &mut entry.data {
                DataValue::SortedSet(zset) => zset.remove(member),
                _ => return Err(CitrineError::WrongType),
            },
        };
        if entries
            .get(key)
            .is_some_and(|e| matches!(&e.data, DataValue::SortedSet(z) if z.is_empty()))
        {
            entries.remove(key);
        }
        Ok(removed)
    }

    fn with_zset<R>(
        &self,
        key: &Bytes,
        f: impl FnOnce(Option<&SortedSet>) -> R,
    ) -> Result<R, CitrineError> {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => Ok(f(None)),
            Some(entry) => match &entry.data {
                DataValue::SortedSet(zset) => Ok(f(Some(zset))),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    // --- Generic operations ---

    /// `TYPE`: the kind name, or "none" for a missing key.
    pub fn type_of(&self, key: &Bytes) -> &'static str {
        let mut entries = self.entries.lock();
        match Self::live_entry_mut(&mut entries, key) {
            None => "none",
            Some(entry) => entry.data.type_name(),
        }
    }

    /// `KEYS`: exact match, or every live key for the `*` pattern.
    pub fn keys(&self, pattern: &Bytes) -> Vec<Bytes> {
        let mut entries = self.entries.lock();
        let now = now_ms();
        entries.retain(|_, value| !value.is_expired_at(now));
        if pattern.as_ref() == b"*" {
            entries.keys().cloned().collect()
        } else {
            entries.get(pattern).map(|_| pattern.clone()).into_iter().collect()
        }
    }

    /// The number of live keys. Used by tests and diagnostics.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = now_ms();
        entries.retain(|_, value| !value.is_expired_at(now));
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
