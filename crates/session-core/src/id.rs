//! Session identifiers

use std::fmt;

use rand::RngCore;
use session_shared::constants::SESSION_ID_BYTES;

/// Opaque session identifier carried in the session cookie.
///
/// Freshly generated identifiers are 64 lowercase hex characters drawn from
/// 256 bits of `ThreadRng` output. Identifiers taken from a cookie are kept
/// verbatim; no format check is applied and no collision check is made
/// against the datastore.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn from_cookie(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Datastore key: `{prefix}:{id}`.
    pub fn key(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
