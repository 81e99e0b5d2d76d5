#![forbid(unsafe_code)]

//! Shared name → status map.
//!
//! [`ToggleRegistry`] is a cheap, clonable handle: clones share the same
//! underlying map. It is explicitly constructed and handed to whichever
//! coordinators should see the same flags; there is no global instance.
//!
//! # Invariants
//!
//! 1. At most one status per name.
//! 2. Names never written read as `None`.
//! 3. `version()` increments exactly once per write that changes the map
//!    (insert of a new name, or a different value for an existing name).
//!
//! Payloads are never stored here; they travel only with dispatched events.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

#[derive(Default)]
struct Inner {
    items: RefCell<AHashMap<String, bool>>,
    version: Cell<u64>,
}

/// Shared registry of named boolean flags.
#[derive(Clone, Default)]
pub struct ToggleRegistry {
    inner: Rc<Inner>,
}

impl ToggleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries into the registry. Existing names are overwritten.
    pub fn add_item<K, I>(&self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        let mut changed = false;
        {
            let mut items = self.inner.items.borrow_mut();
            for (name, status) in entries {
                changed |= items.insert(name.into(), status) != Some(status);
            }
        }
        if changed {
            self.bump();
        }
    }

    /// Current status for `name`, or `None` if it was never added.
    #[must_use]
    pub fn get_item(&self, name: &str) -> Option<bool> {
        self.inner.items.borrow().get(name).copied()
    }

    /// Set the status for `name`, creating the entry if absent.
    pub fn update_status(&self, name: &str, value: bool) {
        let previous = self.inner.items.borrow_mut().insert(name.to_owned(), value);
        if previous != Some(value) {
            self.bump();
        }
    }

    /// Whether `name` has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.items.borrow().contains_key(name)
    }

    /// Number of names held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// All names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.items.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// All entries, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, bool)> {
        let mut entries: Vec<(String, bool)> = self
            .inner
            .items
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether two handles share the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn bump(&self) {
        self.inner.version.set(self.inner.version.get().wrapping_add(1));
    }
}

impl fmt::Debug for ToggleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleRegistry")
            .field("items", &self.snapshot())
            .field("version", &self.version())
            .finish()
    }
}
