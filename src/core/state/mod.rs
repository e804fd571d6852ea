// src/core/state/mod.rs

//! Defines the central `ServerState` struct, holding all shared server-wide
//! state. It is wrapped in an `Arc` and passed to every connection task,
//! providing a single source of truth — there are no globals.

use crate::config::Config;
use crate::core::blocking::BlockerManager;
use crate::core::pubsub::PubSubManager;
use crate::core::storage::Keyspace;
use crate::core::stream_blocking::StreamBlockerManager;
use std::sync::Arc;

/// The central struct holding all shared, server-wide state.
#[derive(Debug)]
pub struct ServerState {
    /// The server's runtime configuration, fixed at startup.
    pub config: Config,
    /// The shared key-to-value store.
    pub keyspace: Keyspace,
    /// The manager for all publish-subscribe channels and patterns.
    pub pubsub: PubSubManager,
    /// Manages clients blocked on `BLPOP`.
    pub blocker_manager: Arc<BlockerManager>,
    /// Manages clients blocked on `XREAD BLOCK`.
    pub stream_blocker_manager: Arc<StreamBlockerManager>,
}

impl ServerState {
    /// Builds the shared state from a configuration and a (possibly
    /// snapshot-loaded) keyspace.
    pub fn new(config: Config, keyspace: Keyspace) -> Self {
        Self {
            config,
            keyspace,
            pubsub: PubSubManager::new(),
            blocker_manager: Arc::new(BlockerManager::new()),
            stream_blocker_manager: Arc::new(StreamBlockerManager::new()),
        }
    }
}
