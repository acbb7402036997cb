//! Datastore port and binding lookup

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

/// Key-value store with per-key expiration.
///
/// Implementations are shared across requests and must be safe to call
/// concurrently. `put` overwrites unconditionally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Lookup of datastores by binding name.
pub trait Bindings: Send + Sync {
    fn datastore(&self, name: &str) -> Option<Arc<dyn Datastore>>;
}

/// Process-wide table of named datastores.
#[derive(Clone, Default)]
pub struct DatastoreRegistry {
    stores: HashMap<String, Arc<dyn Datastore>>,
}

impl DatastoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, store: Arc<dyn Datastore>) -> Self {
        self.insert(name, store);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, store: Arc<dyn Datastore>) {
        self.stores.insert(name.into(), store);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl Bindings for DatastoreRegistry {
    fn datastore(&self, name: &str) -> Option<Arc<dyn Datastore>> {
        self.stores.get(name).cloned()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Map-backed store without expiry.
    #[derive(Default)]
    pub struct MapStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl Datastore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.entries.lock().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &str, _ttl_seconds: u64) -> Result<(), StoreError> {
            self.entries.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.entries.lock().remove(key);
            Ok(())
        }
    }
}
