//! # Session Core
//! 
//! Session lifecycle: identifier issuing, cookie renewal, lazy payload
//! loading and explicit save/destroy against a key-value datastore.

pub mod config;
pub mod cookie;
pub mod error;
pub mod handle;
pub mod id;
pub mod session;
pub mod store;

pub use config::{DatastoreRef, SessionConfig};
pub use cookie::{CookieAccess, CookieAttributes};
pub use error::{SessionError, StoreError};
pub use handle::{LoadStatus, SessionData, SessionHandle};
pub use id::SessionId;
pub use session::Session;
pub use session_shared::config::CookieRenewal;
pub use store::{Bindings, Datastore, DatastoreRegistry};
