//! Set-based registries of shared entries.
//!
//! Listeners, top-level commands and each command's children are all kept in
//! a [`Registry`]. Entries are identified by their `Arc`, not by value:
//! registering the same `Arc` twice keeps one entry, and unregistering
//! removes it.
//!
//! Reads hand out a snapshot, so callers iterate without holding the lock and
//! may register or unregister from inside a handler.

use std::sync::Arc;

use parking_lot::RwLock;

/// An ordered set of `Arc<T>` keyed by pointer identity.
pub struct Registry<T: ?Sized> {
    entries: RwLock<Vec<Arc<T>>>,
}

impl<T: ?Sized> Registry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Appends `entry` unless it is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn register(&self, entry: Arc<T>) -> bool {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| Arc::ptr_eq(e, &entry)) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Removes `entry` if present. Returns `true` if it was removed.
    pub fn unregister(&self, entry: &Arc<T>) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|e| Arc::ptr_eq(e, entry)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `entry` is registered.
    pub fn contains(&self, entry: &Arc<T>) -> bool {
        self.entries.read().iter().any(|e| Arc::ptr_eq(e, entry))
    }

    /// Snapshot of all entries in registration order.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.entries.read().clone()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}
