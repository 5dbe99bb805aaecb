use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory index from string key to entity.
///
/// Readers share the lock; a writer excludes everyone else for the length of
/// its call. Values are cloned out, so callers never hold the lock.
#[derive(Debug)]
pub struct Container<T> {
    items: RwLock<HashMap<String, T>>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Container {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> Container<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        self.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn delete(&self, key: &str) -> Option<T> {
        self.write().remove(key)
    }

    /// All values, in no particular order
    pub fn all(&self) -> Vec<T> {
        self.read().values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.read().len()
    }

    /// Swap the whole index for a freshly built one.
    pub fn replace(&self, items: HashMap<String, T>) {
        *self.write() = items;
    }

    /// Remove `from` and insert `value` under `to` in one critical section.
    pub fn rekey(&self, from: &str, to: impl Into<String>, value: T) {
        let mut items = self.write();
        items.remove(from);
        items.insert(to.into(), value);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}
