//! Synchronization bus: one-way publication of engine events.
//!
//! Every accepted state machine transition is published here as a full
//! session snapshot. Subscribers (scrubber, preview, anything else) derive
//! their views from the snapshot; nothing flows back except through
//! commands.

use crate::event::EngineEvent;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use uuid::Uuid;

type Callback = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Subscriber registry. Publishing clones the subscriber list and invokes
/// callbacks outside the lock, so a callback may subscribe or unsubscribe
/// without deadlocking.
#[derive(Default)]
pub struct SyncBus {
    subscribers: Mutex<Vec<(Uuid, Callback)>>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to engine events. The subscription unsubscribes when
    /// dropped.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            bus: Arc::downgrade(self),
        }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: &EngineEvent) {
        let subscribers: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in subscribers {
            cb(event);
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn remove(&self, id: Uuid) {
        self.subscribers.lock().retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Handle returned by [`SyncBus::subscribe`]; dropping it removes the
/// subscriber.
pub struct Subscription {
    id: Uuid,
    bus: Weak<SyncBus>,
}

impl Subscription {
    /// Explicitly unsubscribe (equivalent to dropping).
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}
