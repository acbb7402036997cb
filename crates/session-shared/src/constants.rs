//! Session-wide constants

pub const DEFAULT_COOKIE_NAME: &str = "__session";
pub const DEFAULT_KEY_PREFIX: &str = "session";
pub const DEFAULT_DATASTORE_BINDING: &str = "SESSION_DATASTORE";

/// 30 days
pub const DEFAULT_TTL_SECONDS: u64 = 2_592_000;
pub const TTL_MIN_SECONDS: u64 = 60;
/// 400 days, the longest Max-Age browsers honor
pub const TTL_MAX_SECONDS: u64 = 400 * 24 * 60 * 60;

pub const SESSION_ID_BYTES: usize = 32;
pub const SESSION_ID_LENGTH: usize = SESSION_ID_BYTES * 2;

pub const COOKIE_PATH: &str = "/";
