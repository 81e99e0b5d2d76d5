#![forbid(unsafe_code)]

//! Scoped boolean toggles for flagbus.
//!
//! Independent consumers share a named boolean flag ("is this modal open")
//! without a common parent by routing every change through a scoped
//! publish/subscribe channel:
//!
//! - [`IdGenerator`]: opaque identifiers for channel scopes.
//! - [`EventScope`]: an immutable per-instance scope key.
//! - [`ToggleRegistry`]: shared name → status map.
//! - [`Transport`] / [`EventBus`]: the subscribe/dispatch seam and its
//!   in-process implementation.
//! - [`ToggleCoordinator`]: flips, dispatches, and applies toggle events.
//!
//! # Architecture
//!
//! Everything is single-threaded and uses `Rc<RefCell<..>>` for shared
//! ownership. Dispatch is synchronous: every subscriber registered when
//! `dispatch` is called has run by the time it returns.
//!
//! A toggle request never writes local state directly. The coordinator
//! dispatches the next status on the channel, and its own subscription
//! applies it to the registry and notifies observers, so the originator and
//! every other subscriber see transitions in the same order.
//!
//! # Invariants
//!
//! 1. The registry holds at most one status per name.
//! 2. An absent name reads as `false`; the first toggle yields `true`.
//! 3. The coordinator holds exactly one transport subscription per name.
//! 4. Dropping or unsubscribing a [`Subscription`] removes its callback
//!    before the next dispatch.
//! 5. Scope identifiers never change after construction.

pub mod bus;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod id;
pub mod registry;
pub mod scope;

pub use bus::{Channel, EventBus, Subscription, Transport};
pub use config::{ScopeMode, ToggleConfig};
pub use coordinator::{ObserverHandle, ToggleCoordinator, ToggleEvent};
pub use error::ToggleError;
pub use id::{DEFAULT_ID_LENGTH, IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use registry::ToggleRegistry;
pub use scope::{EventScope, SCOPE_SEPARATOR, SCOPE_SUFFIX};

/// Key identifying one logical boolean flag.
pub type ToggleName = String;
