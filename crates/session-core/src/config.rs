//! Per-middleware session configuration

use std::fmt;
use std::sync::Arc;

use session_shared::config::{CookieRenewal, SessionSettings};
use session_shared::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_DATASTORE_BINDING, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECONDS,
    TTL_MAX_SECONDS, TTL_MIN_SECONDS,
};
use tracing::error;

use crate::error::SessionError;
use crate::store::{Bindings, Datastore};

/// Where the session datastore comes from.
#[derive(Clone)]
pub enum DatastoreRef {
    /// A live handle.
    Direct(Arc<dyn Datastore>),
    /// A binding name looked up per request.
    Named(String),
}

impl DatastoreRef {
    pub fn resolve(&self, bindings: &dyn Bindings) -> Result<Arc<dyn Datastore>, SessionError> {
        match self {
            DatastoreRef::Direct(store) => Ok(store.clone()),
            DatastoreRef::Named(name) => bindings.datastore(name).ok_or_else(|| {
                error!(binding = %name, "Session datastore binding could not be resolved");
                SessionError::DatastoreNotFound { binding: name.clone() }
            }),
        }
    }
}

impl Default for DatastoreRef {
    fn default() -> Self {
        DatastoreRef::Named(DEFAULT_DATASTORE_BINDING.to_string())
    }
}

impl fmt::Debug for DatastoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreRef::Direct(_) => f.write_str("Direct(..)"),
            DatastoreRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Immutable once handed to the middleware.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub prefix: String,
    pub ttl: u64,
    pub datastore: DatastoreRef,
    pub cookie_renewal: CookieRenewal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: DEFAULT_TTL_SECONDS,
            datastore: DatastoreRef::default(),
            cookie_renewal: CookieRenewal::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_datastore(mut self, store: Arc<dyn Datastore>) -> Self {
        self.datastore = DatastoreRef::Direct(store);
        self
    }

    pub fn with_binding(mut self, name: impl Into<String>) -> Self {
        self.datastore = DatastoreRef::Named(name.into());
        self
    }

    pub fn with_cookie_renewal(mut self, renewal: CookieRenewal) -> Self {
        self.cookie_renewal = renewal;
        self
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            cookie_name: settings.cookie_name.clone(),
            prefix: settings.prefix.clone(),
            ttl: settings.ttl,
            datastore: DatastoreRef::Named(settings.datastore.clone()),
            cookie_renewal: settings.cookie_renewal,
        }
    }
}

pub fn validate_ttl(ttl: u64) -> Result<(), SessionError> {
    if !(TTL_MIN_SECONDS..=TTL_MAX_SECONDS).contains(&ttl) {
        return Err(SessionError::InvalidTtl {
            ttl,
            min: TTL_MIN_SECONDS,
            max: TTL_MAX_SECONDS,
        });
    }
    Ok(())
}
