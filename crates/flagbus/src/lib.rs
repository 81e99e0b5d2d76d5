#![forbid(unsafe_code)]

//! flagbus public facade.
//!
//! Re-exports the core toggle machinery and adds [`ToggleController`], a
//! framework-independent handle that keeps a local `{status, payload}` view
//! of one named toggle in sync with its channel.
//!
//! ```
//! use flagbus::prelude::*;
//!
//! let bus = EventBus::<ToggleEvent<()>>::new();
//! let coordinator: ToggleCoordinator<()> = ToggleCoordinator::new(ToggleRegistry::new(), bus);
//!
//! let sidebar = ToggleController::new(&coordinator, "sidebar", false);
//! let header_button = ToggleController::new(&coordinator, "sidebar", false);
//!
//! header_button.toggle();
//! assert!(sidebar.status());
//! ```

pub mod controller;

pub use controller::{ToggleController, ToggleState};
pub use flagbus_core::{
    Channel, DEFAULT_ID_LENGTH, EventBus, EventScope, IdGenerator, ObserverHandle,
    RandomIdGenerator, ScopeMode, SequentialIdGenerator, Subscription, ToggleConfig,
    ToggleCoordinator, ToggleError, ToggleEvent, ToggleName, ToggleRegistry, Transport,
};

/// Common imports.
pub mod prelude {
    pub use crate::controller::{ToggleController, ToggleState};
    pub use flagbus_core::{
        EventBus, ScopeMode, ToggleConfig, ToggleCoordinator, ToggleEvent, ToggleRegistry,
        Transport,
    };
}
