#![forbid(unsafe_code)]

//! Toggle coordination over a scoped transport.
//!
//! A [`ToggleCoordinator`] ties a [`ToggleRegistry`], an [`EventScope`] and a
//! [`Transport`] together. Each toggle name maps to one channel; the
//! coordinator holds exactly one transport subscription per name it has
//! seen and fans incoming events out to locally registered observers.
//!
//! # Protocol
//!
//! ```text
//! request_toggle(name) ── read registry (absent = false)
//!                      ── dispatch {status: !current, payload} on channel(name)
//!                                 │
//!        transport ◄──────────────┘
//!            │ every subscriber of channel(name), this coordinator included
//!            ▼
//! on_event(name, event) ── registry.update_status(name, event.status)
//!                       ── notify observers of name
//! ```
//!
//! `request_toggle` never writes the registry itself. The write happens when
//! the event comes back through the transport, so the originator and every
//! other listener apply transitions in dispatch order.
//!
//! # Invariants
//!
//! 1. At most one transport subscription per name per coordinator.
//! 2. A name is subscribed before the first toggle of it is dispatched.
//! 3. Observers for a name are notified in registration order, after the
//!    registry has been updated.
//! 4. `unregister` is idempotent.
//!
//! # Failure Modes
//!
//! - Observer panic: propagates out of the dispatch that delivered it.
//! - Two origins toggling the same name concurrently: last dispatch wins.
//!   No further ordering is attempted.
//! - An observer that captures a clone of its own coordinator keeps it
//!   alive; capture state handles or a `Weak` instead.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::bus::{Channel, Subscription, Transport};
use crate::config::{ScopeMode, ToggleConfig};
use crate::error::ToggleError;
use crate::id::{IdGenerator, RandomIdGenerator};
use crate::registry::ToggleRegistry;
use crate::scope::EventScope;

/// A status transition as carried on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEvent<P> {
    pub status: bool,
    /// Data attached to this transition only.
    pub payload: Option<P>,
}

impl<P> ToggleEvent<P> {
    #[must_use]
    pub fn new(status: bool, payload: Option<P>) -> Self {
        Self { status, payload }
    }
}

/// Token returned by [`ToggleCoordinator::register`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObserverHandle {
    name: String,
    id: u64,
}

impl ObserverHandle {
    /// The toggle name this observer listens to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Observer<P> {
    id: u64,
    active: Cell<bool>,
    callback: Box<dyn Fn(&ToggleEvent<P>)>,
}

struct Inner<P> {
    registry: ToggleRegistry,
    scope: EventScope,
    mode: ScopeMode,
    transport: Rc<dyn Transport<ToggleEvent<P>>>,
    subscriptions: RefCell<AHashMap<String, Subscription>>,
    observers: RefCell<AHashMap<String, Vec<Rc<Observer<P>>>>>,
    next_observer: Cell<u64>,
}

/// Coordinates named boolean toggles over a scoped transport.
///
/// Clones share the same state and subscriptions.
pub struct ToggleCoordinator<P> {
    inner: Rc<Inner<P>>,
}

impl<P> Clone for ToggleCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: 'static> ToggleCoordinator<P> {
    /// Create a coordinator with per-instance scoping.
    pub fn new(
        registry: ToggleRegistry,
        transport: impl Transport<ToggleEvent<P>> + 'static,
    ) -> Self {
        Self::from_parts(registry, transport, EventScope::new(), ScopeMode::PerInstance)
    }

    /// Create a coordinator from a validated configuration, with a random
    /// instance scope.
    pub fn with_config(
        registry: ToggleRegistry,
        transport: impl Transport<ToggleEvent<P>> + 'static,
        config: &ToggleConfig,
    ) -> Result<Self, ToggleError> {
        Self::with_config_and_generator(registry, transport, config, &RandomIdGenerator)
    }

    /// Like [`with_config`](Self::with_config), drawing the instance scope
    /// from `generator`, e.g. a
    /// [`SequentialIdGenerator`](crate::id::SequentialIdGenerator).
    pub fn with_config_and_generator(
        registry: ToggleRegistry,
        transport: impl Transport<ToggleEvent<P>> + 'static,
        config: &ToggleConfig,
        generator: &dyn IdGenerator,
    ) -> Result<Self, ToggleError> {
        config.validate()?;
        let scope = EventScope::with_generator(generator, config.id_length);
        Ok(Self::from_parts(
            registry,
            transport,
            scope,
            config.scope_mode.clone(),
        ))
    }

    /// Create a coordinator from an existing scope and mode.
    pub fn from_parts(
        registry: ToggleRegistry,
        transport: impl Transport<ToggleEvent<P>> + 'static,
        scope: EventScope,
        mode: ScopeMode,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                registry,
                scope,
                mode,
                transport: Rc::new(transport),
                subscriptions: RefCell::new(AHashMap::new()),
                observers: RefCell::new(AHashMap::new()),
                next_observer: Cell::new(1),
            }),
        }
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> &ToggleRegistry {
        &self.inner.registry
    }

    /// This coordinator's instance scope.
    #[must_use]
    pub fn scope(&self) -> &EventScope {
        &self.inner.scope
    }

    #[must_use]
    pub fn scope_mode(&self) -> &ScopeMode {
        &self.inner.mode
    }

    /// Channel carrying events for `name`.
    #[must_use]
    pub fn channel(&self, name: &str) -> Channel {
        Channel::new(self.inner.mode.scope_for(&self.inner.scope, name), name)
    }

    /// Seed statuses and subscribe to each name.
    pub fn add_item<K, I>(&self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        let entries: Vec<(String, bool)> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        for (name, _) in &entries {
            self.subscribe(name);
        }
        self.inner.registry.add_item(entries);
    }

    /// Registry status for `name`, `None` if never seen.
    #[must_use]
    pub fn get_item(&self, name: &str) -> Option<bool> {
        self.inner.registry.get_item(name)
    }

    /// Registry status for `name`, absent reading as `false`.
    #[must_use]
    pub fn status(&self, name: &str) -> bool {
        self.get_item(name).unwrap_or(false)
    }

    /// Dispatch the flip of the current status of `name`.
    pub fn request_toggle(&self, name: &str, payload: Option<P>) {
        let next = !self.status(name);
        self.set_status(name, next, payload);
    }

    /// [`request_toggle`](Self::request_toggle) without a payload.
    pub fn toggle(&self, name: &str) {
        self.request_toggle(name, None);
    }

    /// Dispatch an explicit status for `name`.
    pub fn set_status(&self, name: &str, status: bool, payload: Option<P>) {
        self.subscribe(name);
        let channel = self.channel(name);
        tracing::trace!(scope = %channel.scope, name, status, "toggle dispatch");
        self.inner
            .transport
            .dispatch(&channel, &ToggleEvent { status, payload });
    }

    /// Apply an event delivered for `name`: update the registry, then
    /// notify observers.
    pub fn on_event(&self, name: &str, event: &ToggleEvent<P>) {
        let channel = self.channel(name);
        tracing::trace!(scope = %channel.scope, name, status = event.status, "toggle event");
        self.inner.registry.update_status(name, event.status);

        let snapshot: Vec<Rc<Observer<P>>> = self
            .inner
            .observers
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default();
        for observer in snapshot {
            if observer.active.get() {
                (observer.callback)(event);
            }
        }
    }

    /// Register `callback` for transitions of `name`.
    pub fn register(
        &self,
        name: &str,
        callback: impl Fn(&ToggleEvent<P>) + 'static,
    ) -> ObserverHandle {
        self.subscribe(name);
        let id = self.inner.next_observer.get();
        self.inner.next_observer.set(id + 1);
        self.inner
            .observers
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(Rc::new(Observer {
                id,
                active: Cell::new(true),
                callback: Box::new(callback),
            }));
        ObserverHandle {
            name: name.to_owned(),
            id,
        }
    }

    /// Remove an observer. Returns `false` if it was already removed.
    pub fn unregister(&self, handle: &ObserverHandle) -> bool {
        let removed = {
            let mut observers = self.inner.observers.borrow_mut();
            let Some(list) = observers.get_mut(&handle.name) else {
                return false;
            };
            let removed = list
                .iter()
                .position(|o| o.id == handle.id)
                .map(|pos| list.remove(pos));
            if list.is_empty() {
                observers.remove(&handle.name);
            }
            removed
        };
        match removed {
            Some(observer) => {
                observer.active.set(false);
                true
            }
            None => false,
        }
    }

    /// Observers registered for `name`.
    #[must_use]
    pub fn observer_count(&self, name: &str) -> usize {
        self.inner.observers.borrow().get(name).map_or(0, Vec::len)
    }

    /// Whether the coordinator holds a transport subscription for `name`.
    #[must_use]
    pub fn is_subscribed(&self, name: &str) -> bool {
        self.inner.subscriptions.borrow().contains_key(name)
    }

    /// Subscribe to the channel for `name` unless already subscribed.
    pub fn subscribe(&self, name: &str) {
        if self.is_subscribed(name) {
            return;
        }
        let weak: Weak<Inner<P>> = Rc::downgrade(&self.inner);
        let owned = name.to_owned();
        let channel = self.channel(name);
        let subscription = self.inner.transport.subscribe(
            &channel,
            Box::new(move |event: &ToggleEvent<P>| {
                if let Some(inner) = weak.upgrade() {
                    ToggleCoordinator { inner }.on_event(&owned, event);
                }
            }),
        );
        tracing::debug!(scope = %channel.scope, name, "toggle subscribed");
        self.inner
            .subscriptions
            .borrow_mut()
            .insert(name.to_owned(), subscription);
    }

    /// Drop the transport subscription for `name`. Safe to repeat.
    pub fn unsubscribe(&self, name: &str) -> bool {
        let subscription = self.inner.subscriptions.borrow_mut().remove(name);
        match subscription {
            Some(mut subscription) => {
                subscription.unsubscribe();
                tracing::debug!(scope = %self.inner.scope, name, "toggle unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Drop every transport subscription and observer.
    pub fn close(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        let observers = std::mem::take(&mut *self.inner.observers.borrow_mut());
        for observer in observers.values().flatten() {
            observer.active.set(false);
        }
        tracing::debug!(
            scope = %self.inner.scope,
            channels = subscriptions.len(),
            "coordinator closed"
        );
        drop(subscriptions);
        drop(observers);
    }
}

impl<P> fmt::Debug for ToggleCoordinator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleCoordinator")
            .field("scope", &self.inner.scope)
            .field("mode", &self.inner.mode)
            .field("registry", &self.inner.registry)
            .field("subscriptions", &self.inner.subscriptions.borrow().len())
            .finish()
    }
}
