use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use session_core::{Datastore, StoreError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::entry::Entry;

/// In-process datastore with per-key expiry.
///
/// Expired entries are dropped lazily on read and in bulk by
/// [`purge_expired`](Self::purge_expired).
#[derive(Clone, Default)]
pub struct MemoryDatastore {
    map: Arc<DashMap<String, Entry>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let e = self.map.get(key)?;
        if e.is_expired(now) {
            return None;
        }
        Some(e.expires_at.saturating_duration_since(now))
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.map.len();
        self.map.retain(|_, e| !e.is_expired(now));
        let count = before.saturating_sub(self.map.len());
        if count > 0 {
            debug!("Purged {} expired session records", count);
        }
        count
    }

    /// Runs [`purge_expired`](Self::purge_expired) every `interval` on the current runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        info!("Starting memory datastore sweeper every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.purge_expired();
            }
        })
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let Some(e) = self.map.get(key) else {
            return Ok(None);
        };
        if e.is_expired(now) {
            drop(e);
            self.map.remove_if(key, |_, e| e.is_expired(now));
            return Ok(None);
        }
        Ok(Some(e.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let e = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.map.insert(key.to_string(), e);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}
