//! Subscription fan-out
//!
//! A small callback registry with explicit handles. Dispatch snapshots the
//! handle list before iterating and re-checks membership before each call,
//! so a subscriber removed mid-dispatch neither receives further events
//! from that pass nor breaks iteration.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Opaque subscription handle; pass back to [`EventBus::unsubscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// Multi-subscriber broadcast channel for one event type
pub struct EventBus<T> {
    next_handle: AtomicU64,
    subscribers: Mutex<BTreeMap<u64, Callback<T>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        EventBus {
            next_handle: AtomicU64::new(1),
            subscribers: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<T> EventBus<T> {
    pub fn new() -> EventBus<T> {
        EventBus::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, Arc::new(callback));
        trace!(handle = id, "Subscribed");
        SubscriptionHandle(id)
    }

    /// Remove a subscriber. Unknown handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers.lock().remove(&handle.0);
        trace!(handle = handle.0, "Unsubscribed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Broadcast to every subscriber registered at the moment of the event.
    ///
    /// The lock is not held across callbacks, so a callback may subscribe
    /// or unsubscribe without deadlocking. A handle removed during this
    /// pass is skipped for the rest of the pass.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            let still_registered = self.subscribers.lock().contains_key(&id);
            if still_registered {
                callback(event);
            }
        }
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
