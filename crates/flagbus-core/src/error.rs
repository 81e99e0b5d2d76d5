#![forbid(unsafe_code)]

//! Errors from configuring flagbus.
//!
//! Toggle operations themselves are total: absent names read as `false` and
//! unsubscribing is always safe. Only configuration can be rejected.

use std::fmt;

/// Errors from flagbus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleError {
    /// Scope identifiers must have at least one character.
    InvalidIdLength(usize),
    /// A name-qualified scope needs a non-empty namespace.
    EmptyNamespace,
    /// A configuration document could not be parsed.
    Parse(String),
}

impl fmt::Display for ToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdLength(len) => write!(f, "invalid scope id length: {len}"),
            Self::EmptyNamespace => f.write_str("scope namespace must not be empty"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ToggleError {}
