// src/core/blocking.rs

//! Manages clients that are blocked waiting for data on list keys (`BLPOP`).
//!
//! Each blocked client is represented by a one-shot reply channel. Producers
//! (`LPUSH`/`RPUSH`) pop the element themselves and hand it through the
//! channel, so there is never a "who owns the pop?" race between producer
//! and waiter.

use crate::core::CitrineError;
use crate::core::protocol::RespValue;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::keyspace::Keyspace;
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

/// The value handed to a woken `BLPOP` client.
#[derive(Debug, Clone)]
pub struct PoppedValue {
    pub key: Bytes,
    pub value: Bytes,
}

/// The waker sends the popped value, eliminating the need for a re-read.
type Waker = oneshot::Sender<PoppedValue>;

/// A shareable waker. The `Option` allows it to be `take()`-n so it is used
/// at most once.
type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Holds information about a waiting client, including its session id for cleanup.
#[derive(Debug)]
struct WaiterInfo {
    session_id: u64,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on list keys, FIFO per key.
#[derive(Debug, Default)]
pub struct BlockerManager {
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

impl BlockerManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Orchestrates `BLPOP` for a single key.
    ///
    /// Fast path: if the list is non-empty, pop under the keyspace mutex and
    /// reply immediately. Otherwise the waiter registers *before* the
    /// keyspace guard is released, closing the window in which a concurrent
    /// push could be missed, and then suspends on its one-shot channel.
    /// `wait_timeout == None` waits forever.
    pub async fn orchestrate_blpop(
        self: &Arc<Self>,
        keyspace: &Keyspace,
        session_id: u64,
        key: &Bytes,
        wait_timeout: Option<Duration>,
    ) -> Result<RespValue, CitrineError> {
        let (shared_waker, rx) = {
            let mut entries = keyspace.lock();
            match Keyspace::live_entry_mut(&mut entries, key) {
                Some(entry) => match &mut entry.data {
                    DataValue::List(list) => {
                        if let Some(value) = list.pop_front() {
                            Keyspace::drop_if_empty_list(&mut entries, key);
                            return Ok(blpop_reply(key.clone(), value));
                        }
                    }
                    _ => return Err(CitrineError::WrongType),
                },
                None => {}
            }

            // Register while still holding the keyspace guard. Lock order is
            // keyspace -> waiter map on both consumer and producer sides.
            let (tx, rx) = oneshot::channel();
            let shared_waker: SharedWaker = Arc::new(Mutex::new(Some(tx)));
            self.waiters.entry(key.clone()).or_default().push_back(WaiterInfo {
                session_id,
                waker: shared_waker.clone(),
            });
            debug!("Session {session_id}: blocked on list key {:?}", key);
            (shared_waker, rx)
        };

        let outcome = match wait_timeout {
            Some(duration) => timeout(duration, rx).await.ok(),
            None => Some(rx.await),
        };

        // Whatever happened, make sure no entry for this waiter survives.
        self.remove_waiter(key, &shared_waker);

        match outcome {
            Some(Ok(popped)) => Ok(blpop_reply(popped.key, popped.value)),
            // Timed out, or the waker was dropped without a delivery.
            _ => Ok(RespValue::NullArray),
        }
    }

    /// Called by `LPUSH`/`RPUSH` while the keyspace guard is still held.
    /// Hands one head element to the longest-waiting live waiter, if any.
    /// Delivery failures (the waiter gave up concurrently) put the element
    /// back and move on to the next waiter.
    pub fn notify_and_serve_push(&self, key: &Bytes, list: &mut VecDeque<Bytes>) {
        loop {
            let Some(mut queue) = self.waiters.get_mut(key) else {
                return;
            };
            let Some(info) = queue.pop_front() else {
                drop(queue);
                self.waiters.remove(key);
                return;
            };
            drop(queue);

            let Some(waker) = info.waker.lock().unwrap().take() else {
                // Already consumed; a stale queue entry awaiting cleanup.
                continue;
            };
            let Some(value) = list.pop_front() else {
                return;
            };
            match waker.send(PoppedValue {
                key: key.clone(),
                value,
            }) {
                Ok(()) => {
                    debug!("Handed off value to session {} for list key {:?}", info.session_id, key);
                    return;
                }
                Err(popped) => {
                    // Receiver vanished between dequeue and send. Undo the pop
                    // and offer the element to the next waiter.
                    list.push_front(popped.value);
                }
            }
        }
    }

    /// Removes a specific waker from a key's queue after delivery or timeout.
    fn remove_waiter(&self, key: &Bytes, waker_to_remove: &SharedWaker) {
        if let Some(mut queue) = self.waiters.get_mut(key) {
            queue.retain(|info| !Arc::ptr_eq(&info.waker, waker_to_remove));
            if queue.is_empty() {
                drop(queue);
                self.waiters.remove(key);
            }
        }
    }

    /// Removes all wakers for a session upon client disconnection.
    pub fn remove_waiters_for_session(&self, session_id: u64) {
        self.waiters.iter_mut().for_each(|mut queue| {
            queue.retain(|info| info.session_id != session_id);
        });
        self.waiters.retain(|_, queue| !queue.is_empty());
        debug!("Removed any pending list blockers for session {session_id}");
    }

    /// The number of registered waiters for a key. Test/diagnostic hook.
    pub fn waiter_count(&self, key: &Bytes) -> usize {
        self.waiters.get(key).map_or(0, |q| q.len())
    }
}

/// The `BLPOP` success reply: `[key, element]`.
fn blpop_reply(key: Bytes, value: Bytes) -> RespValue {
    RespValue::Array(vec![RespValue::BulkString(key), RespValue::BulkString(value)])
}
