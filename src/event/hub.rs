//! Event Hub
//!
//! Shared, synchronous event source owned by the connection.
//!
//! ## Dispatch
//! - Handlers run in registration order, on the publishing thread
//! - The handler list is snapshotted before dispatch, so a handler may call
//!   [`EventHub::off`] (entity teardown) without deadlocking
//! - A subscription removed mid-dispatch is skipped for the rest of it

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{EventKind, ServerEvent};

/// Callback invoked for a published event
pub type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Handle returned by [`EventHub::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

struct Slot {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
    active: Arc<AtomicBool>,
}

/// Shared event source
pub struct EventHub {
    slots: Mutex<Vec<Slot>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for one event kind
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().push(Slot {
            id,
            kind,
            handler: Arc::new(handler),
            active: Arc::new(AtomicBool::new(true)),
        });
        tracing::trace!(%id, %kind, "subscribed");
        id
    }

    /// Remove a handler; returns false when it was not registered
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut slots = self.slots.lock();
        match slots.iter().position(|slot| slot.id == id) {
            Some(index) => {
                let slot = slots.remove(index);
                slot.active.store(false, Ordering::Release);
                tracing::trace!(%id, kind = %slot.kind, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Deliver an event to every handler registered for its kind
    ///
    /// Returns how many handlers were invoked.
    pub fn publish(&self, event: &ServerEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<(Handler, Arc<AtomicBool>)> = self
            .slots
            .lock()
            .iter()
            .filter(|slot| slot.kind == kind)
            .map(|slot| (Arc::clone(&slot.handler), Arc::clone(&slot.active)))
            .collect();

        let mut invoked = 0;
        for (handler, active) in targets {
            if !active.load(Ordering::Acquire) {
                continue;
            }
            handler(event);
            invoked += 1;
        }
        tracing::trace!(%kind, invoked, "published event");
        invoked
    }

    pub fn subscription_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Number of handlers registered for one kind
    pub fn count_for(&self, kind: EventKind) -> usize {
        self.slots.lock().iter().filter(|slot| slot.kind == kind).count()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.slots.lock().iter().any(|slot| slot.id == id)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
