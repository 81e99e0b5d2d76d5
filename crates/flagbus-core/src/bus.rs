#![forbid(unsafe_code)]

//! Scoped publish/subscribe transport.
//!
//! The coordinator only talks to the [`Transport`] trait. [`EventBus`] is the
//! in-process implementation: a map from [`Channel`] to subscriber entries.
//!
//! # Invariants
//!
//! 1. Subscribers on a channel are invoked in registration order.
//! 2. `dispatch` snapshots the subscriber list before invoking anything, so
//!    callbacks may subscribe, unsubscribe, or dispatch re-entrantly.
//! 3. A subscription cancelled during a dispatch is not invoked for the
//!    remainder of that dispatch.
//! 4. [`Subscription::unsubscribe`] is idempotent; dropping the guard
//!    unsubscribes.
//!
//! # Failure Modes
//!
//! - Callback panic: propagates to the caller of `dispatch`. Remaining
//!   subscribers for that dispatch are skipped.
//! - Bus dropped while subscriptions are alive: unsubscribing becomes a
//!   no-op.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

/// A `(scope, event_name)` pair addressing one logical channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub scope: String,
    pub event_name: String,
}

impl Channel {
    #[must_use]
    pub fn new(scope: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            event_name: event_name.into(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.event_name)
    }
}

/// Subscribe/dispatch seam between the coordinator and the event channel.
pub trait Transport<E> {
    /// Register `callback` for `channel`. The returned guard keeps it alive.
    fn subscribe(&self, channel: &Channel, callback: Box<dyn Fn(&E)>) -> Subscription;

    /// Synchronously deliver `event` to every current subscriber of `channel`.
    fn dispatch(&self, channel: &Channel, event: &E);
}

/// RAII guard for a transport subscription.
///
/// Dropping the guard unsubscribes. [`Subscription::default`] is an inert
/// guard that was never subscribed; unsubscribing it does nothing.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Default)]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Build a guard that runs `cancel` exactly once on unsubscribe or drop.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the callback. Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether the guard still holds a live registration.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct Entry<E> {
    id: u64,
    active: Cell<bool>,
    callback: Box<dyn Fn(&E)>,
}

struct BusInner<E> {
    channels: RefCell<AHashMap<Channel, Vec<Rc<Entry<E>>>>>,
    next_id: Cell<u64>,
}

/// In-process, single-threaded [`Transport`].
///
/// Clones share the same channel table.
pub struct EventBus<E> {
    inner: Rc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner {
                channels: RefCell::new(AHashMap::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Subscribe with a plain closure.
    pub fn subscribe_fn(
        &self,
        channel: &Channel,
        callback: impl Fn(&E) + 'static,
    ) -> Subscription {
        self.subscribe(channel, Box::new(callback))
    }

    /// Live subscribers on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: &Channel) -> usize {
        self.inner
            .channels
            .borrow()
            .get(channel)
            .map_or(0, Vec::len)
    }

    /// Channels with at least one live subscriber.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.channels.borrow().len()
    }

    fn remove(inner: &Weak<BusInner<E>>, channel: &Channel, id: u64) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let removed = {
            let mut channels = inner.channels.borrow_mut();
            let Some(entries) = channels.get_mut(channel) else {
                return;
            };
            let removed = entries
                .iter()
                .position(|e| e.id == id)
                .map(|pos| entries.remove(pos));
            if entries.is_empty() {
                channels.remove(channel);
            }
            removed
        };
        // The callback may own guards for this bus; drop it unborrowed.
        if let Some(entry) = removed {
            entry.active.set(false);
            drop(entry);
            tracing::debug!(channel = %channel, id, "unsubscribed");
        }
    }
}

impl<E: 'static> Transport<E> for EventBus<E> {
    fn subscribe(&self, channel: &Channel, callback: Box<dyn Fn(&E)>) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let entry = Rc::new(Entry {
            id,
            active: Cell::new(true),
            callback,
        });
        self.inner
            .channels
            .borrow_mut()
            .entry(channel.clone())
            .or_default()
            .push(entry);
        tracing::debug!(channel = %channel, id, "subscribed");

        let weak = Rc::downgrade(&self.inner);
        let channel = channel.clone();
        Subscription::new(move || Self::remove(&weak, &channel, id))
    }

    fn dispatch(&self, channel: &Channel, event: &E) {
        let snapshot: Vec<Rc<Entry<E>>> = self
            .inner
            .channels
            .borrow()
            .get(channel)
            .cloned()
            .unwrap_or_default();
        tracing::trace!(channel = %channel, subscribers = snapshot.len(), "dispatch");

        for entry in snapshot {
            if entry.active.get() {
                (entry.callback)(event);
            }
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.inner.channels.borrow().len())
            .finish()
    }
}
