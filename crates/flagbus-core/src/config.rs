#![forbid(unsafe_code)]

//! Coordinator configuration.
//!
//! Two channel-scoping strategies exist:
//!
//! | Mode | Channel scope | Same name in two coordinators |
//! |------|---------------|-------------------------------|
//! | [`ScopeMode::PerInstance`] | the coordinator's opaque scope id | isolated |
//! | [`ScopeMode::NameQualified`] | `<namespace>:<name>` | shared |
//!
//! Per-instance is the default. Name-qualified scoping is opt-in for
//! consumers that deliberately want every coordinator on a transport to
//! follow the same flag.
//!
//! With the `config` feature, configuration can be loaded from TOML:
//!
//! ```toml
//! id_length = 24
//!
//! [scope_mode]
//! kind = "name-qualified"
//! namespace = "dialogs"
//! ```

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::ToggleError;
use crate::id::DEFAULT_ID_LENGTH;
use crate::scope::EventScope;

/// Namespace used by [`ScopeMode::name_qualified_default`].
pub const DEFAULT_NAMESPACE: &str = "toggles";

/// How a coordinator derives the channel scope for a toggle name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "kebab-case")
)]
pub enum ScopeMode {
    /// Use the coordinator's own [`EventScope`] id for every name.
    #[default]
    PerInstance,
    /// Use `<namespace>:<name>`, shared by every coordinator on the transport.
    NameQualified { namespace: String },
}

impl ScopeMode {
    /// Name-qualified scoping under [`DEFAULT_NAMESPACE`].
    #[must_use]
    pub fn name_qualified_default() -> Self {
        Self::NameQualified {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Channel scope for `name` under this mode.
    #[must_use]
    pub fn scope_for(&self, instance: &EventScope, name: &str) -> String {
        match self {
            Self::PerInstance => instance.scope_id().to_string(),
            Self::NameQualified { namespace } => format!("{namespace}:{name}"),
        }
    }
}

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize), serde(default))]
pub struct ToggleConfig {
    /// Length of the random part of the instance scope id.
    pub id_length: usize,
    pub scope_mode: ScopeMode,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_ID_LENGTH,
            scope_mode: ScopeMode::default(),
        }
    }
}

impl ToggleConfig {
    /// Per-instance scoping with the default id length.
    #[must_use]
    pub fn per_instance() -> Self {
        Self::default()
    }

    /// Name-qualified scoping under `namespace`.
    #[must_use]
    pub fn name_qualified(namespace: impl Into<String>) -> Self {
        Self {
            scope_mode: ScopeMode::NameQualified {
                namespace: namespace.into(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self
    }

    /// Reject configurations no coordinator can run with.
    pub fn validate(&self) -> Result<(), ToggleError> {
        if self.id_length == 0 {
            return Err(ToggleError::InvalidIdLength(self.id_length));
        }
        if let ScopeMode::NameQualified { namespace } = &self.scope_mode {
            if namespace.trim().is_empty() {
                return Err(ToggleError::EmptyNamespace);
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    #[cfg(feature = "config")]
    pub fn from_toml_str(input: &str) -> Result<Self, ToggleError> {
        let config: Self = toml::from_str(input).map_err(|e| ToggleError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ToggleError> {
        toml::to_string(self).map_err(|e| ToggleError::Parse(e.to_string()))
    }
}
