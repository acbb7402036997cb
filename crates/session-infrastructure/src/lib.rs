//! # Session Infrastructure
//! 
//! Datastore implementations (adapters) and binding setup.

pub mod bindings;
pub mod store;

pub use bindings::build_registry;
pub use store::{MemoryDatastore, RedisDatastore};
