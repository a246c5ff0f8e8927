//! Connection registry
//!
//! The set of live subscribers, keyed by connection identity. Every set
//! operation takes the lock for the duration of the map update only; no
//! caller ever holds it across a socket write or an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::subscriber::{ConnectionId, Subscriber};

/// Thread-safe set of registered subscribers
pub struct ConnectionRegistry {
    subscribers: Mutex<HashMap<ConnectionId, Arc<Subscriber>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate an identity for a new connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a subscriber.
    ///
    /// Returns false when the handle is already present or already closed;
    /// a closed handle is never registered again.
    pub fn add(&self, subscriber: Arc<Subscriber>) -> bool {
        let mut subscribers = self.subscribers.lock();
        // Checked under the lock: evict closes while holding it
        if subscriber.is_closed() || subscribers.contains_key(&subscriber.id()) {
            return false;
        }
        subscribers.insert(subscriber.id(), subscriber);
        true
    }

    /// Remove a subscriber without closing it. Removing an absent id is a no-op.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Subscriber>> {
        self.subscribers.lock().remove(&id)
    }

    /// Remove a subscriber and close its transport.
    ///
    /// Safe to call from the broadcast path and the connection's own loop at
    /// the same time; returns true only for the caller that removed it.
    pub fn evict(&self, subscriber: &Subscriber) -> bool {
        let mut subscribers = self.subscribers.lock();
        let removed = subscribers.remove(&subscriber.id()).is_some();
        subscriber.close();
        removed
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.subscribers.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Copy of the current handles, taken under the lock.
    ///
    /// Handles added after the snapshot are not included; handles removed
    /// after it simply fail delivery.
    pub fn snapshot(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.lock().values().cloned().collect()
    }

    /// Remove and close every subscriber (shutdown)
    pub fn close_all(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        let closed = subscribers.len();
        for (_, subscriber) in subscribers.drain() {
            subscriber.close();
        }
        closed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
