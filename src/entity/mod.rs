//! Entity Module
//!
//! Stateful domain objects built from a listing record. An entity caches the
//! server-reported properties, re-publishes matching protocol events as its
//! own scoped events and tears its subscriptions down deterministically.
//!
//! ## Lifecycle
//! ```text
//!   Record ──new()──▶ live ──terminal event / destroy() / drop──▶ destroyed
//!                      │                                            │
//!                      └─ handlers on the parent's EventHub ────────┘ removed
//! ```
//!
//! Handlers capture only weak references to the entity state and the parent,
//! so a dropped entity or connection never keeps the other alive.

mod client;
mod server;

pub use client::{Client, ClientEvent, ClientIdentity, ClientKind, PermissionRef};
pub use server::{VirtualServer, VirtualServerEvent, VirtualServerIdentity, VirtualServerKind};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crossbeam::channel::{self, Receiver};
use parking_lot::{Mutex, RwLock};

use crate::error::{QueryError, Result};
use crate::event::{EventHub, EventKind, ServerEvent, SubscriptionId};
use crate::protocol::{Command, Record, Response, Value};

// =============================================================================
// Collaborators
// =============================================================================

/// The connection an entity belongs to
///
/// Supplied by the transport layer: it executes commands (matching the
/// response to the request) and owns the shared event source.
pub trait Parent: Send + Sync + 'static {
    /// Execute a command and return its parsed response
    ///
    /// A failing `error` line must be reported as [`QueryError::Response`].
    fn execute(&self, command: Command) -> Result<Response>;

    /// The shared event source notifications are published on
    fn events(&self) -> &EventHub;
}

/// One event an entity reacts to
pub struct Binding<I, E> {
    /// Event kind to subscribe to
    pub kind: EventKind,

    /// Whether the event is about the entity with this identity
    pub matches: fn(&I, &ServerEvent) -> bool,

    /// Entity-scoped event to emit; `None` emits nothing
    pub project: fn(&ServerEvent) -> Option<E>,

    /// Tear the entity down after emitting
    pub terminal: bool,
}

/// Static description of an entity type
pub trait EntityKind: Send + Sync + 'static {
    /// Name used in logs and errors
    const NAME: &'static str;

    /// Namespace prefix stripped from cached property names
    const PREFIX: &'static str;

    type Identity: Clone + fmt::Debug + Send + Sync + 'static;
    type Event: Clone + fmt::Debug + Send + 'static;

    /// Record fields consumed by the identity (not cached as properties)
    fn identity_fields() -> &'static [&'static str];

    fn identity(record: &Record) -> Result<Self::Identity>;

    fn bindings() -> Vec<Binding<Self::Identity, Self::Event>>;

    /// Listing command whose response contains this entity
    fn refresh_command(identity: &Self::Identity) -> Command;

    /// Whether a listing record describes this entity
    fn matches_record(identity: &Self::Identity, record: &Record) -> bool;
}

// =============================================================================
// Entity Base
// =============================================================================

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct EntityState<K: EntityKind> {
    identity: K::Identity,
    properties: RwLock<Record>,
    listeners: Mutex<Vec<Listener<K::Event>>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    destroyed: AtomicBool,
}

impl<K: EntityKind> EntityState<K> {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn emit(&self, event: &K::Event) {
        let listeners: Vec<Listener<K::Event>> = self.listeners.lock().clone();
        tracing::trace!(entity = K::NAME, identity = ?self.identity, ?event, "emit");
        for listener in listeners {
            listener(event);
        }
    }

    /// Mark destroyed and drop every subscription; only the first call acts
    fn teardown(&self, hub: Option<&EventHub>) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        if let Some(hub) = hub {
            for id in &subscriptions {
                hub.off(*id);
            }
        }
        tracing::debug!(
            entity = K::NAME,
            identity = ?self.identity,
            removed = subscriptions.len(),
            "entity destroyed"
        );
    }
}

/// A domain object bound to a parent connection
///
/// Exclusively owned by its creator; dropping it destroys it.
pub struct Entity<K: EntityKind, P: Parent> {
    state: Arc<EntityState<K>>,
    parent: Weak<P>,
}

impl<K: EntityKind, P: Parent> Entity<K, P> {
    /// Build an entity from one listing record and subscribe it to `parent`
    pub fn new(parent: &Arc<P>, record: Record) -> Result<Self> {
        let identity = K::identity(&record)?;
        let state = Arc::new(EntityState::<K> {
            identity,
            properties: RwLock::new(strip_properties::<K>(record)),
            listeners: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        });

        let hub = parent.events();
        for binding in K::bindings() {
            let id = hub.on(binding.kind, dispatcher(&state, parent, binding));
            state.subscriptions.lock().push(id);
        }

        tracing::debug!(entity = K::NAME, identity = ?state.identity, "entity created");
        Ok(Self {
            state,
            parent: Arc::downgrade(parent),
        })
    }

    pub fn identity(&self) -> &K::Identity {
        &self.state.identity
    }

    /// A cached property by its un-prefixed name
    pub fn property(&self, name: &str) -> Option<Value> {
        self.state.properties.read().get(name).cloned()
    }

    /// Snapshot of the property cache
    pub fn properties(&self) -> Record {
        self.state.properties.read().clone()
    }

    /// Re-query the parent and replace the property cache
    pub fn refresh(&self) -> Result<()> {
        let identity = &self.state.identity;
        let response = self.execute(K::refresh_command(identity))?;
        let record = response
            .into_records()
            .into_iter()
            .find(|record| K::matches_record(identity, record))
            .ok_or_else(|| QueryError::EntityNotFound(format!("{} {:?}", K::NAME, identity)))?;

        *self.state.properties.write() = strip_properties::<K>(record);
        tracing::debug!(entity = K::NAME, identity = ?identity, "properties refreshed");
        Ok(())
    }

    /// Register a callback for this entity's scoped events
    pub fn listen<F>(&self, listener: F) -> Result<()>
    where
        F: Fn(&K::Event) + Send + Sync + 'static,
    {
        if self.is_destroyed() {
            return Err(QueryError::EntityDestroyed);
        }
        self.state.listeners.lock().push(Arc::new(listener));
        Ok(())
    }

    /// Receive this entity's scoped events on a channel
    pub fn subscribe(&self) -> Result<Receiver<K::Event>> {
        let (tx, rx) = channel::unbounded();
        self.listen(move |event: &K::Event| {
            // A dropped receiver just stops listening
            let _ = tx.send(event.clone());
        })?;
        Ok(rx)
    }

    /// Remove all subscriptions; safe to call more than once
    pub fn destroy(&self) {
        match self.parent.upgrade() {
            Some(parent) => self.state.teardown(Some(parent.events())),
            None => self.state.teardown(None),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }

    /// Number of live subscriptions on the parent's event source
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.lock().len()
    }

    pub fn parent(&self) -> Result<Arc<P>> {
        self.parent.upgrade().ok_or(QueryError::ParentGone)
    }

    /// Run a command through the parent
    pub(crate) fn execute(&self, command: Command) -> Result<Response> {
        self.parent()?.execute(command)
    }

    /// Run a command and keep its first record
    pub(crate) fn execute_first(&self, command: Command) -> Result<Record> {
        Ok(self.execute(command)?.into_first().unwrap_or_default())
    }
}

impl<K: EntityKind, P: Parent> Drop for Entity<K, P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<K: EntityKind, P: Parent> fmt::Debug for Entity<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::NAME)
            .field("identity", &self.state.identity)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Build the hub handler for one binding
///
/// Emits first and tears down afterwards, so listeners of a terminal event
/// still observe a live entity.
fn dispatcher<K: EntityKind, P: Parent>(
    state: &Arc<EntityState<K>>,
    parent: &Arc<P>,
    binding: Binding<K::Identity, K::Event>,
) -> impl Fn(&ServerEvent) + Send + Sync + 'static {
    let Binding {
        matches,
        project,
        terminal,
        ..
    } = binding;
    let state = Arc::downgrade(state);
    let parent = Arc::downgrade(parent);

    move |event: &ServerEvent| {
        let Some(state) = state.upgrade() else {
            return;
        };
        if state.is_destroyed() || !matches(&state.identity, event) {
            return;
        }
        if let Some(scoped) = project(event) {
            state.emit(&scoped);
        }
        if terminal {
            let parent = parent.upgrade();
            state.teardown(parent.as_ref().map(|p| p.events()));
        }
    }
}

/// Strip the kind's prefix from field names and drop identity fields
fn strip_properties<K: EntityKind>(record: Record) -> Record {
    let identity_fields = K::identity_fields();
    record
        .into_iter()
        .filter(|(key, _)| !identity_fields.contains(&key.as_str()))
        .map(|(key, value)| (strip_prefix(K::PREFIX, key), value))
        .collect()
}

fn strip_prefix(prefix: &str, key: String) -> String {
    match key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => key,
    }
}
