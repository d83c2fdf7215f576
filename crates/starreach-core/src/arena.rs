//! Resident entities addressed by ID.
//!
//! Each entry is its own [`Watchable`], so mutating one entity never waits
//! on another. The map lock is held only to look up or insert an entry and
//! never across an `.await`. Entries stay resident once loaded.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::watchable::{Versioned, Watchable};

/// A map from ID to shared [`Watchable`].
#[derive(Debug)]
pub struct Arena<K, T> {
    entries: Mutex<HashMap<K, Arc<Watchable<T>>>>,
}

impl<K, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> Arena<K, T>
where
    K: Eq + Hash + Copy,
    T: Versioned + Clone + Send + Sync + 'static,
{
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// The resident entry for `id`, if loaded.
    pub fn get(&self, id: K) -> Option<Arc<Watchable<T>>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Make `value` resident unless another caller already did.
    ///
    /// Returns the resident entry, which is the existing one when two
    /// loaders race.
    pub fn insert_or_existing(&self, id: K, value: T) -> Arc<Watchable<T>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(id)
                .or_insert_with(|| Arc::new(Watchable::new(value))),
        )
    }

    /// Number of resident entities.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no entity is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
