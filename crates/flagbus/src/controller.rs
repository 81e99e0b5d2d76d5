#![forbid(unsafe_code)]

//! Local view of one named toggle.
//!
//! A [`ToggleController`] is what a UI component holds instead of a
//! render-prop wrapper: it registers an observer on a
//! [`ToggleCoordinator`], mirrors the latest `{status, payload}` locally,
//! and exposes `toggle()` for the component's own controls.
//!
//! # Invariants
//!
//! 1. The local status only changes through events delivered on the
//!    channel, never directly from `toggle()`.
//! 2. `version()` increments once per delivered event.
//! 3. Dropping the controller unregisters its observer; `detach()` is
//!    idempotent.
//!
//! # Usage
//!
//! ```
//! use flagbus::prelude::*;
//!
//! let bus = EventBus::<ToggleEvent<&'static str>>::new();
//! let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus);
//!
//! let modal = ToggleController::new(&coordinator, "confirm-delete", false);
//! modal.toggle_with("row-42");
//!
//! let state = modal.state();
//! assert!(state.status);
//! assert_eq!(state.payload, Some("row-42"));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use flagbus_core::{ObserverHandle, ToggleCoordinator, ToggleEvent};

/// Locally mirrored toggle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleState<P> {
    pub status: bool,
    /// Payload of the most recent transition, if any.
    pub payload: Option<P>,
}

impl<P: Clone> From<&ToggleEvent<P>> for ToggleState<P> {
    fn from(event: &ToggleEvent<P>) -> Self {
        Self {
            status: event.status,
            payload: event.payload.clone(),
        }
    }
}

/// Framework-independent handle on one named toggle.
pub struct ToggleController<P: 'static> {
    name: String,
    coordinator: ToggleCoordinator<P>,
    state: Rc<RefCell<ToggleState<P>>>,
    version: Rc<Cell<u64>>,
    handle: Option<ObserverHandle>,
}

impl<P: Clone + 'static> ToggleController<P> {
    /// Attach to `name` on `coordinator`.
    ///
    /// If the registry has no entry for `name` it is seeded with
    /// `init_status`; otherwise the existing status wins.
    pub fn new(
        coordinator: &ToggleCoordinator<P>,
        name: impl Into<String>,
        init_status: bool,
    ) -> Self {
        let name = name.into();
        let status = match coordinator.get_item(&name) {
            Some(status) => status,
            None => {
                coordinator.add_item([(name.clone(), init_status)]);
                init_status
            }
        };

        let state = Rc::new(RefCell::new(ToggleState {
            status,
            payload: None,
        }));
        let version = Rc::new(Cell::new(0));

        let s = Rc::clone(&state);
        let v = Rc::clone(&version);
        let handle = coordinator.register(&name, move |event| {
            *s.borrow_mut() = ToggleState::from(event);
            v.set(v.get() + 1);
        });
        tracing::debug!(name = %name, status, "toggle controller attached");

        Self {
            name,
            coordinator: coordinator.clone(),
            state,
            version,
            handle: Some(handle),
        }
    }

    /// Current local status.
    #[must_use]
    pub fn status(&self) -> bool {
        self.state.borrow().status
    }

    /// Payload of the last delivered transition.
    #[must_use]
    pub fn payload(&self) -> Option<P> {
        self.state.borrow().payload.clone()
    }

    #[must_use]
    pub fn state(&self) -> ToggleState<P> {
        self.state.borrow().clone()
    }

    /// Request a flip of this toggle.
    pub fn toggle(&self) {
        self.coordinator.request_toggle(&self.name, None);
    }

    /// Request a flip carrying `payload`.
    pub fn toggle_with(&self, payload: P) {
        self.coordinator.request_toggle(&self.name, Some(payload));
    }

    /// Request an explicit status.
    pub fn set(&self, status: bool) {
        self.coordinator.set_status(&self.name, status, None);
    }
}

impl<P: 'static> ToggleController<P> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Events delivered since attaching.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop following the channel. The last local state is kept.
    pub fn detach(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.coordinator.unregister(&handle);
            tracing::debug!(name = %self.name, "toggle controller detached");
        }
    }
}

impl<P: 'static> Drop for ToggleController<P> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<P: fmt::Debug + 'static> fmt::Debug for ToggleController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleController")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .field("attached", &self.is_attached())
            .finish()
    }
}
