use async_trait::async_trait;
use deadpool_redis::redis::{AsyncCommands, RedisError};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, PoolError, Runtime};
use session_core::{Datastore, StoreError};
use tracing::{info, warn};

/// Redis-backed datastore. Records are written with `SET key value EX ttl`.
#[derive(Clone)]
pub struct RedisDatastore {
    pool: Pool,
}

impl RedisDatastore {
    /// Builds the pool. No connection is opened until the first command.
    pub fn new(url: &str, max_connections: usize) -> Result<Self, StoreError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_connections));
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Backend(format!("Failed to create Redis pool: {}", e)))?;
        info!("Redis datastore pool created (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(|e: PoolError| {
            warn!("Failed to get Redis connection: {}", e);
            StoreError::Unavailable(e.to_string())
        })
    }
}

fn command_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl Datastore for RedisDatastore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(command_error)?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await.map_err(command_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await.map_err(command_error)?;
        Ok(())
    }
}
