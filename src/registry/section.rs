//! Lazily populated cache shared between threads.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::error::JsonResult;

/// One cache of the registry, guarded by its own lock so unrelated caches
/// never contend.
pub struct RegistrySection<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> RegistrySection<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Empty section; `name` labels log lines.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.read().get(key).cloned()
    }

    /// Whether `key` is cached.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.read().contains_key(key)
    }

    /// Cached value for `key`, computing it on a miss.
    ///
    /// `compute` runs without the lock held, so it may consult this or other
    /// sections. When two threads race, the first stored value wins and both
    /// return it. Failures are not cached.
    pub fn get_or_try_insert(&self, key: K, compute: impl FnOnce() -> JsonResult<V>) -> JsonResult<V> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = compute()?;
        let mut entries = self.entries.write();
        let stored = entries.entry(key).or_insert(value).clone();
        tracing::debug!(section = self.name, entries = entries.len(), "cache entry computed");
        Ok(stored)
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.entries.write().insert(key, value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the section is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
