//! Session handle given to request handlers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use session_shared::config::CookieRenewal;
use tracing::{debug, error, warn};

use crate::cookie::{self, CookieAccess};
use crate::error::SessionError;
use crate::id::SessionId;
use crate::store::Datastore;

/// Session payload: an open-ended JSON object.
pub type SessionData = serde_json::Map<String, Value>;

/// How the payload was obtained when the session was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Identifier was just minted; the store was not consulted.
    Fresh,
    /// Payload read from the store.
    Restored,
    /// The store had no record for the identifier.
    Missing,
    /// Reading or parsing failed; payload fell back to empty.
    Degraded(String),
}

/// Values captured at load time. Save and destroy only ever see this copy.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub key: String,
    pub ttl: u64,
    pub cookie_name: String,
    pub cookie_renewal: CookieRenewal,
}

struct Inner {
    snapshot: SessionSnapshot,
    is_new: bool,
    status: LoadStatus,
    data: Mutex<SessionData>,
    deleted: AtomicBool,
    store: Arc<dyn Datastore>,
    cookies: Arc<dyn CookieAccess>,
}

/// Cloning is cheap; every clone shares the same payload.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    pub(crate) fn new(
        snapshot: SessionSnapshot,
        is_new: bool,
        status: LoadStatus,
        data: SessionData,
        store: Arc<dyn Datastore>,
        cookies: Arc<dyn CookieAccess>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot,
                is_new,
                status,
                data: Mutex::new(data),
                deleted: AtomicBool::new(false),
                store,
                cookies,
            }),
        }
    }

    pub fn id(&self) -> &str {
        self.inner.snapshot.id.as_str()
    }

    pub fn key(&self) -> &str {
        &self.inner.snapshot.key
    }

    pub fn is_new(&self) -> bool {
        self.inner.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.inner.deleted.load(Ordering::Acquire)
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.inner.status
    }

    /// Copy of the current payload.
    pub fn data(&self) -> SessionData {
        self.inner.data.lock().clone()
    }

    /// Mutates the payload in place.
    pub fn with_data<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut data = self.inner.data.lock();
        f(&mut *data)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.data.lock().get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.inner.data.lock().insert(key.into(), value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.data.lock().remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.lock().is_empty()
    }

    /// Writes the payload under the session key with the configured TTL.
    ///
    /// A datastore failure is logged and returned; it never panics or aborts
    /// the request. Fails with [`SessionError::Destroyed`] once `destroy` ran.
    pub async fn save(&self) -> Result<(), SessionError> {
        let snapshot = &self.inner.snapshot;
        if self.is_deleted() {
            warn!(key = %snapshot.key, "Refusing to save a destroyed session");
            return Err(SessionError::Destroyed);
        }

        let payload = serde_json::to_string(&*self.inner.data.lock())?;
        match self.inner.store.put(&snapshot.key, &payload, snapshot.ttl).await {
            Ok(()) => {
                if snapshot.cookie_renewal == CookieRenewal::OnSave {
                    cookie::refresh_cookie(
                        self.inner.cookies.as_ref(),
                        &snapshot.cookie_name,
                        &snapshot.id,
                        snapshot.ttl,
                    );
                }
                debug!(key = %snapshot.key, ttl = snapshot.ttl, bytes = payload.len(), "Session saved");
                Ok(())
            }
            Err(e) => {
                error!(operation = "put", key = %snapshot.key, error = %e, "Failed to save session");
                Err(e.into())
            }
        }
    }

    /// Clears the payload, expires the cookie and deletes the stored record.
    ///
    /// Safe to call repeatedly; each call re-issues the delete.
    pub async fn destroy(&self) -> Result<(), SessionError> {
        let snapshot = &self.inner.snapshot;
        self.inner.deleted.store(true, Ordering::Release);
        self.inner.data.lock().clear();
        cookie::expire_cookie(self.inner.cookies.as_ref(), &snapshot.cookie_name);

        match self.inner.store.delete(&snapshot.key).await {
            Ok(()) => {
                debug!(key = %snapshot.key, "Session destroyed");
                Ok(())
            }
            Err(e) => {
                error!(operation = "delete", key = %snapshot.key, error = %e, "Failed to destroy session");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.snapshot.id.short())
            .field("is_new", &self.inner.is_new)
            .field("status", &self.inner.status)
            .field("deleted", &self.is_deleted())
            .finish()
    }
}
