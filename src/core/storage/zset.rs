// src/core/storage/zset.rs

//! The sorted-set engine: a member-to-score mapping ordered by
//! `(score, member)` ascending, with integer-rank queries.

use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::collections::HashMap;

/// A sorted set of unique members with 64-bit float scores.
///
/// Membership lookups go through the hash map; ordered queries (`ZRANK`,
/// `ZRANGE`) sort a snapshot on demand. `OrderedFloat` gives a total order
/// even for `nan` scores, which are admissible per float parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    members: HashMap<Bytes, f64>,
}

impl SortedSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts or updates a member. Returns `true` iff the member was newly added.
    pub fn add(&mut self, member: Bytes, score: f64) -> bool {
        self.members.insert(member, score).is_none()
    }

    /// Removes a member. Returns `true` iff it was present.
    pub fn remove(&mut self, member: &Bytes) -> bool {
        self.members.remove(member).is_some()
    }

    pub fn score(&self, member: &Bytes) -> Option<f64> {
        self.members.get(member).copied()
    }

    /// The cardinality of the set.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members sorted ascending by score, ties broken lexicographically by member.
    pub fn sorted_members(&self) -> Vec<Bytes> {
        let mut entries: Vec<(&Bytes, f64)> =
            self.members.iter().map(|(m, s)| (m, *s)).collect();
        entries.sort_by(|a, b| {
            OrderedFloat(a.1)
                .cmp(&OrderedFloat(b.1))
                .then_with(|| a.0.cmp(b.0))
        });
        entries.into_iter().map(|(m, _)| m.clone()).collect()
    }

    /// The 0-based rank of a member in the sorted order, or `None` if absent.
    pub fn rank(&self, member: &Bytes) -> Option<usize> {
        self.members.get(member)?;
        self.sorted_members().iter().position(|m| m == member)
    }
}
