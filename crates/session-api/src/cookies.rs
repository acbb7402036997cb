//! Cookie transport for one request/response pair.

use std::collections::HashMap;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::Cookie;
use parking_lot::Mutex;
use session_core::{CookieAccess, CookieAttributes};
use tracing::warn;

/// Reads cookies from the request and collects the ones to send back.
///
/// Only the last write per cookie name is emitted.
#[derive(Debug, Default)]
pub struct RequestCookies {
    incoming: HashMap<String, String>,
    outgoing: Mutex<Vec<Cookie<'static>>>,
}

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut incoming = HashMap::new();
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for parsed in Cookie::split_parse(value).flatten() {
                // First occurrence wins.
                incoming
                    .entry(parsed.name().to_string())
                    .or_insert_with(|| parsed.value().to_string());
            }
        }
        Self {
            incoming,
            outgoing: Mutex::new(Vec::new()),
        }
    }

    /// Cookies queued for the response, in write order.
    pub fn pending(&self) -> Vec<Cookie<'static>> {
        self.outgoing.lock().clone()
    }

    /// Appends one `Set-Cookie` header per pending cookie.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for c in self.outgoing.lock().iter() {
            match HeaderValue::from_str(&c.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => warn!("Dropping cookie {} with invalid header value: {}", c.name(), e),
            }
        }
    }

    fn push(&self, cookie: Cookie<'static>) {
        let mut outgoing = self.outgoing.lock();
        outgoing.retain(|c| c.name() != cookie.name());
        outgoing.push(cookie);
    }
}

fn build(name: &str, value: &str, attributes: &CookieAttributes) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .http_only(attributes.http_only)
        .path(attributes.path.clone());
    if let Some(max_age) = attributes.max_age {
        let seconds = i64::try_from(max_age).unwrap_or(i64::MAX);
        builder = builder.max_age(time::Duration::seconds(seconds));
    }
    builder.build()
}

impl CookieAccess for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        self.push(build(name, value, attributes));
    }

    fn delete(&self, name: &str, attributes: &CookieAttributes) {
        let mut removal = build(name, "", attributes);
        removal.make_removal();
        self.push(removal);
    }
}
