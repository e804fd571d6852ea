// src/core/stream_blocking.rs

//! Manages clients blocked on stream keys, for `XREAD` with the `BLOCK`
//! option. Each waiter records the id it has already seen; `XADD` wakes the
//! longest-waiting client whose recorded id is strictly below the new
//! entry's id, delivering the entry itself through the waiter's one-shot
//! channel.

use crate::core::storage::stream::{StreamEntry, StreamId};
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

type Waker = oneshot::Sender<StreamEntry>;
type SharedWaker = Arc<Mutex<Option<Waker>>>;

#[derive(Debug)]
struct WaiterInfo {
    session_id: u64,
    /// Entries must be strictly newer than this to wake the client.
    last_id: StreamId,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on stream reads, FIFO per key.
#[derive(Debug, Default)]
pub struct StreamBlockerManager {
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

/// A registration handle: the receiver the blocked task awaits, plus the
/// shared waker used for cleanup.
pub struct StreamWaiter {
    shared_waker: SharedWaker,
    rx: oneshot::Receiver<StreamEntry>,
}

impl StreamBlockerManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a waiter for `key`. The caller must still be holding the
    /// keyspace guard so no `XADD` can slip between its empty fast-path read
    /// and this registration.
    pub fn register(&self, key: &Bytes, session_id: u64, last_id: StreamId) -> StreamWaiter {
        let (tx, rx) = oneshot::channel();
        let shared_waker: SharedWaker = Arc::new(Mutex::new(Some(tx)));
        self.waiters.entry(key.clone()).or_default().push_back(WaiterInfo {
            session_id,
            last_id,
            waker: shared_waker.clone(),
        });
        debug!("Session {session_id}: blocked on stream key {key:?} after {last_id}");
        StreamWaiter { shared_waker, rx }
    }

    /// Awaits delivery on a registered waiter, deregistering on every exit
    /// path. Returns the delivered entry, or `None` on timeout.
    pub async fn wait(
        &self,
        key: &Bytes,
        waiter: StreamWaiter,
        wait_timeout: Option<Duration>,
    ) -> Option<StreamEntry> {
        let outcome = match wait_timeout {
            Some(duration) => timeout(duration, waiter.rx).await.ok(),
            None => Some(waiter.rx.await),
        };
        self.remove_waiter(key, &waiter.shared_waker);
        match outcome {
            Some(Ok(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Called by `XADD` while the keyspace guard is still held. Wakes the
    /// first waiter whose recorded id is strictly less than the new entry's
    /// id, delivering the entry. Dead wakers are skipped.
    pub fn notify(&self, key: &Bytes, entry: &StreamEntry) {
        let Some(mut queue) = self.waiters.get_mut(key) else {
            return;
        };
        while let Some(pos) = queue
            .iter()
            .position(|info| info.last_id < entry.id && info.waker.lock().unwrap().is_some())
        {
            let Some(info) = queue.remove(pos) else {
                return;
            };
            if let Some(waker) = info.waker.lock().unwrap().take()
                && waker.send(entry.clone()).is_ok()
            {
                debug!(
                    "Delivered stream entry {} to session {} for key {:?}",
                    entry.id, info.session_id, key
                );
                return;
            }
            // Receiver vanished concurrently; try the next eligible waiter.
        }
    }

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
        debug!("Removed any pending stream blockers for session {session_id}");
    }

    /// The number of registered waiters for a key. Test/diagnostic hook.
    pub fn waiter_count(&self, key: &Bytes) -> usize {
        self.waiters.get(key).map_or(0, |q| q.len())
    }
}
