#![forbid(unsafe_code)]

//! Per-instance event scopes.
//!
//! An [`EventScope`] is an immutable channel key of the form
//! `<hash>_<SCOPE_SUFFIX>`. Independent coordinators that each own a scope
//! can share one transport without observing each other's events.

use std::fmt;

use crate::id::{DEFAULT_ID_LENGTH, IdGenerator, RandomIdGenerator};

/// Fixed namespace suffix appended to every generated scope id.
pub const SCOPE_SUFFIX: &str = "flagbusScope";

/// Separator between the generated hash and [`SCOPE_SUFFIX`].
pub const SCOPE_SEPARATOR: char = '_';

/// Immutable, effectively unique scope key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventScope {
    scope_id: String,
}

impl EventScope {
    /// Create a scope with a random 40-character hash.
    #[must_use]
    pub fn new() -> Self {
        Self::with_generator(&RandomIdGenerator, DEFAULT_ID_LENGTH)
    }

    /// Create a scope using the given generator and hash length.
    #[must_use]
    pub fn with_generator(generator: &dyn IdGenerator, length: usize) -> Self {
        let hash = generator.generate(length);
        let scope_id = format!("{hash}{SCOPE_SEPARATOR}{SCOPE_SUFFIX}");
        tracing::debug!(scope = %scope_id, "event scope created");
        Self { scope_id }
    }

    /// The scope identifier.
    #[inline]
    #[must_use]
    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }
}

impl Default for EventScope {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for EventScope {
    fn as_ref(&self) -> &str {
        &self.scope_id
    }
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope_id)
    }
}
