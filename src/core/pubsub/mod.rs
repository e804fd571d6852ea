// src/core/pubsub/mod.rs

//! The core publish-subscribe (Pub/Sub) system.
//! It manages channel and pattern subscriptions and message broadcasting.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::debug;

pub mod handler;

/// The capacity of each individual broadcast channel.
const CHANNEL_CAPACITY: usize = 128;

/// A type alias for messages sent to pattern subscribers.
/// The tuple contains: (original_channel, message).
pub type PMessage = (Bytes, Bytes);

/// `PubSubManager` is the central hub for all Pub/Sub functionality.
/// It uses `DashMap` for thread-safe management of channel and pattern subscriptions.
#[derive(Debug, Default)]
pub struct PubSubManager {
    /// A map from a channel name to its broadcast sender.
    channels: DashMap<Bytes, Arc<Sender<Bytes>>>,
    /// A map from a pattern to its broadcast sender for pattern-based subscriptions.
    pattern_channels: DashMap<Bytes, Arc<Sender<PMessage>>>,
}

impl PubSubManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Subscribes a client to a specific channel, creating it on demand.
    /// Returns the `Receiver` the client's connection handler will listen on.
    pub fn subscribe(&self, channel_name: &Bytes) -> Receiver<Bytes> {
        self.channels
            .entry(channel_name.clone())
            .or_insert_with(|| Arc::new(broadcast::channel(CHANNEL_CAPACITY).0))
            .value()
            .subscribe()
    }

    /// Subscribes a client to a glob-style pattern.
    pub fn subscribe_pattern(&self, pattern: &Bytes) -> Receiver<PMessage> {
        self.pattern_channels
            .entry(pattern.clone())
            .or_insert_with(|| Arc::new(broadcast::channel(CHANNEL_CAPACITY).0))
            .value()
            .subscribe()
    }

    /// Publishes a message to a channel.
    ///
    /// The message goes to direct subscribers of `channel_name` and to
    /// subscribers of any matching pattern. Returns the number of clients
    /// the message was delivered to; failed deliveries don't count.
    pub fn publish(&self, channel_name: &Bytes, message: Bytes) -> usize {
        let mut receivers = 0;

        if let Some(channel) = self.channels.get(channel_name) {
            // `send` returns the number of receivers the message reached.
            receivers += channel.send(message.clone()).unwrap_or(0);
        }

        for entry in self.pattern_channels.iter() {
            if glob_match(entry.key(), channel_name) {
                let pmessage: PMessage = (channel_name.clone(), message.clone());
                receivers += entry.value().send(pmessage).unwrap_or(0);
            }
        }

        receivers
    }

    /// Removes channels and patterns that no longer have any subscribers.
    /// Called when a connection drops its receivers.
    pub fn purge_empty_channels(&self) -> usize {
        let mut purged_count = 0;
        self.channels.retain(|_, sender| {
            if sender.receiver_count() == 0 {
                purged_count += 1;
                false
            } else {
                true
            }
        });
        self.pattern_channels.retain(|_, sender| {
            if sender.receiver_count() == 0 {
                purged_count += 1;
                false
            } else {
                true
            }
        });
        if purged_count > 0 {
            debug!("Purged {purged_count} empty Pub/Sub channels and patterns");
        }
        purged_count
    }

    /// The number of subscribers for a specific channel. Test/diagnostic hook.
    pub fn subscriber_count(&self, channel_name: &Bytes) -> usize {
        self.channels
            .get(channel_name)
            .map_or(0, |s| s.receiver_count())
    }
}

/// Matches a byte string against a glob pattern supporting `*` (any run of
/// bytes, possibly empty) and `?` (exactly one byte).
///
/// The pattern is viewed as literal chunks separated by stars: the first
/// chunk is anchored at the start, the last at the end, and the chunks in
/// between slide rightwards greedily. Greedy leftmost placement is safe
/// here because every later chunk only ever needs more room to its right.
pub fn glob_match(pattern: &[u8], string: &[u8]) -> bool {
    let mut chunks = pattern.split(|&b| b == b'*');
    let head = chunks.next().unwrap_or_default();
    if string.len() < head.len() || !chunk_matches(head, &string[..head.len()]) {
        return false;
    }
    if !pattern.contains(&b'*') {
        // No star: the single chunk must cover the whole string.
        return string.len() == head.len();
    }

    let floating: Vec<&[u8]> = chunks.collect();
    let Some((tail, middle)) = floating.split_last() else {
        return string.len() == head.len();
    };

    let mut searched_to = head.len();
    for chunk in middle {
        match find_chunk(chunk, string, searched_to) {
            Some(found_at) => searched_to = found_at + chunk.len(),
            None => return false,
        }
    }

    // The last chunk must fit at the very end, past everything matched so far.
    string
        .len()
        .checked_sub(tail.len())
        .is_some_and(|tail_start| {
            tail_start >= searched_to && chunk_matches(tail, &string[tail_start..])
        })
}

/// Whether a star-free chunk matches a window of the same length.
fn chunk_matches(chunk: &[u8], window: &[u8]) -> bool {
    chunk.len() == window.len()
        && chunk
            .iter()
            .zip(window)
            .all(|(p, s)| *p == b'?' || p == s)
}

/// The first offset at or after `from` where `chunk` matches.
fn find_chunk(chunk: &[u8], string: &[u8], from: usize) -> Option<usize> {
    let last_start = string.len().checked_sub(chunk.len())?;
    (from..=last_start).find(|&start| chunk_matches(chunk, &string[start..start + chunk.len()]))
}
