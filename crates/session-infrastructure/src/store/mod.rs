//! Datastore adapters

mod entry;
pub mod memory;
pub mod redis;

pub use memory::MemoryDatastore;
pub use redis::RedisDatastore;
