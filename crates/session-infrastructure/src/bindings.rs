//! Datastore bindings built from configuration

use std::sync::Arc;
use std::time::Duration;

use session_core::{DatastoreRegistry, StoreError};
use session_shared::config::{DatastoreKind, DatastoreSettings};
use tracing::info;

use crate::store::{MemoryDatastore, RedisDatastore};

/// Creates one datastore per configured binding.
///
/// Memory stores get a background sweeper, so this must run inside a tokio runtime.
pub fn build_registry(settings: &[DatastoreSettings]) -> Result<DatastoreRegistry, StoreError> {
    let mut registry = DatastoreRegistry::new();
    for ds in settings {
        match ds.kind {
            DatastoreKind::Memory => {
                let store = MemoryDatastore::new();
                if ds.sweep_interval_secs > 0 {
                    store.spawn_sweeper(Duration::from_secs(ds.sweep_interval_secs));
                }
                registry.insert(ds.binding.clone(), Arc::new(store));
            }
            DatastoreKind::Redis => {
                let url = ds.url.as_deref().ok_or_else(|| {
                    StoreError::Backend(format!("Datastore {} has no Redis URL", ds.binding))
                })?;
                let store = RedisDatastore::new(url, ds.max_connections)?;
                registry.insert(ds.binding.clone(), Arc::new(store));
            }
        }
        info!(binding = %ds.binding, kind = ?ds.kind, "Datastore bound");
    }
    Ok(registry)
}
