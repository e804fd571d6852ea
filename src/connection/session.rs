// src/connection/session.rs

//! Defines the state associated with a single client session.

use crate::core::protocol::RespFrame;
use crate::core::pubsub::PMessage;
use bytes::Bytes;
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Holds the state specific to a single client session. It is owned by the
/// connection task; no other task ever touches it.
#[derive(Debug, Default)]
pub struct SessionState {
    /// True if the client is within a `MULTI`/`EXEC` block.
    pub is_in_transaction: bool,
    /// Commands queued since `MULTI`, as raw request frames. They are parsed
    /// at `EXEC` time so queue-time garbage surfaces inside the reply array.
    pub queued_frames: Vec<RespFrame>,
    /// The set of channels the client is directly subscribed to.
    pub subscribed_channels: HashSet<Bytes>,
    /// The set of patterns the client is subscribed to.
    pub subscribed_patterns: HashSet<Bytes>,
    /// A collection of `broadcast::Receiver`s for active subscriptions.
    pub pubsub_receivers: Vec<SubscriptionReceiver>,
}

/// An enum holding a receiver for either a channel or pattern subscription.
#[derive(Debug)]
pub enum SubscriptionReceiver {
    /// A receiver for a specific channel.
    Channel(Bytes, broadcast::Receiver<Bytes>),
    /// A receiver for a glob-style pattern.
    Pattern(Bytes, broadcast::Receiver<PMessage>),
}

impl SessionState {
    pub fn new() -> Self {
        Default::default()
    }

    /// True while the client has at least one channel or pattern
    /// subscription, which restricts the permitted command set.
    pub fn in_subscribe_mode(&self) -> bool {
        !self.subscribed_channels.is_empty() || !self.subscribed_patterns.is_empty()
    }

    /// The subscription count reported in (un)subscribe confirmations.
    pub fn subscription_count(&self) -> usize {
        self.subscribed_channels.len() + self.subscribed_patterns.len()
    }
}
