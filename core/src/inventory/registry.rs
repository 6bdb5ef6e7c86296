use std::sync::Arc;

use dashmap::DashMap;
use ssot_common::model::InventoryObject;
use tokio::sync::Mutex;

/// Published objects of one kind, keyed by natural key.
///
/// Objects are immutable once published; a merge publishes a fresh `Arc`. Writers take the
/// per-key lock from [`Registry::key_lock`] so at most one create or update per key is in
/// flight, while readers never wait on it.
pub struct Registry<T: InventoryObject> {
    objects: DashMap<T::Key, Arc<T>>,
    locks: DashMap<T::Key, Arc<Mutex<()>>>,
}

impl<T: InventoryObject> Registry<T> {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    pub fn get(&self, key: &T::Key) -> Option<Arc<T>> {
        self.objects.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn publish(&self, key: T::Key, object: Arc<T>) {
        self.objects.insert(key, object);
    }

    pub(crate) fn key_lock(&self, key: &T::Key) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key.clone()).or_default().value())
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }

    /// Snapshot of every published object; order is unspecified.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.objects.iter().map(|entry| Arc::clone(entry.value())).collect()
    }
}

impl<T: InventoryObject> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
