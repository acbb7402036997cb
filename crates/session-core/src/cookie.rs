//! Identifier manager: bridges the cookie transport and the session identifier.

use session_shared::constants::COOKIE_PATH;
use tracing::debug;

use crate::id::SessionId;

/// Cookie attributes used when setting or deleting the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub http_only: bool,
    pub path: String,
    /// Max-Age in seconds. `None` when deleting.
    pub max_age: Option<u64>,
}

impl CookieAttributes {
    /// Attributes for (re)issuing the session cookie.
    pub fn renewal(ttl_seconds: u64) -> Self {
        Self {
            http_only: true,
            path: COOKIE_PATH.to_string(),
            max_age: Some(ttl_seconds),
        }
    }

    /// Attributes for removing the session cookie. They match [`renewal`](Self::renewal)
    /// on everything that scopes the cookie, otherwise the browser keeps it.
    pub fn removal() -> Self {
        Self {
            http_only: true,
            path: COOKIE_PATH.to_string(),
            max_age: None,
        }
    }
}

/// Cookie accessor scoped to a single request/response pair.
///
/// Methods take `&self` so one accessor can be shared between the middleware
/// and the session handle given to the request handler.
pub trait CookieAccess: Send + Sync {
    /// Value of the named cookie as sent by the client.
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str, attributes: &CookieAttributes);

    fn delete(&self, name: &str, attributes: &CookieAttributes);
}

/// Outcome of reading the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub id: SessionId,
    pub is_new: bool,
}

/// Reads the named cookie, minting a new identifier when it is absent or empty.
pub fn resolve(cookies: &dyn CookieAccess, cookie_name: &str) -> Resolved {
    match cookies.get(cookie_name) {
        Some(value) if !value.is_empty() => Resolved {
            id: SessionId::from_cookie(value),
            is_new: false,
        },
        _ => {
            let id = SessionId::generate();
            debug!(session = %id.short(), "Issued new session identifier");
            Resolved { id, is_new: true }
        }
    }
}

/// (Re)sets the session cookie with `HttpOnly; Path=/; Max-Age=<ttl>`.
pub fn refresh_cookie(cookies: &dyn CookieAccess, cookie_name: &str, id: &SessionId, ttl_seconds: u64) {
    cookies.set(cookie_name, id.as_str(), &CookieAttributes::renewal(ttl_seconds));
}

pub fn expire_cookie(cookies: &dyn CookieAccess, cookie_name: &str) {
    cookies.delete(cookie_name, &CookieAttributes::removal());
}
