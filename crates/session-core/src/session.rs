//! Session controller: one instance per request.

use std::sync::Arc;

use session_shared::config::CookieRenewal;
use tracing::{debug, warn};

use crate::config::{validate_ttl, SessionConfig};
use crate::cookie::{self, CookieAccess};
use crate::error::SessionError;
use crate::handle::{LoadStatus, SessionData, SessionHandle, SessionSnapshot};
use crate::id::SessionId;
use crate::store::Datastore;

pub struct Session {
    cookies: Arc<dyn CookieAccess>,
    store: Arc<dyn Datastore>,
    cookie_name: String,
    prefix: String,
    ttl: u64,
    cookie_renewal: CookieRenewal,
    id: SessionId,
    is_new: bool,
}

impl Session {
    /// Validates the TTL, then resolves the identifier and refreshes the cookie.
    ///
    /// An invalid TTL fails before the cookie accessor is touched.
    pub fn start(
        cookies: Arc<dyn CookieAccess>,
        store: Arc<dyn Datastore>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        validate_ttl(config.ttl)?;

        let resolved = cookie::resolve(cookies.as_ref(), &config.cookie_name);
        let session = Self {
            cookies,
            store,
            cookie_name: config.cookie_name.clone(),
            prefix: config.prefix.clone(),
            ttl: config.ttl,
            cookie_renewal: config.cookie_renewal,
            id: resolved.id,
            is_new: resolved.is_new,
        };

        if session.cookie_renewal == CookieRenewal::EveryRequest {
            cookie::refresh_cookie(
                session.cookies.as_ref(),
                &session.cookie_name,
                &session.id,
                session.ttl,
            );
        }
        Ok(session)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn key(&self) -> String {
        self.id.key(&self.prefix)
    }

    /// Loads the payload and hands out the session handle.
    ///
    /// New identifiers skip the datastore. Read and parse failures are logged
    /// and reported through [`LoadStatus::Degraded`]; the payload is then empty.
    pub async fn load(self) -> SessionHandle {
        let key = self.key();
        let (data, status) = if self.is_new {
            (SessionData::new(), LoadStatus::Fresh)
        } else {
            self.fetch(&key).await
        };
        debug!(session = %self.id.short(), status = ?status, "Session loaded");

        let snapshot = SessionSnapshot {
            id: self.id,
            key,
            ttl: self.ttl,
            cookie_name: self.cookie_name,
            cookie_renewal: self.cookie_renewal,
        };
        SessionHandle::new(snapshot, self.is_new, status, data, self.store, self.cookies)
    }

    async fn fetch(&self, key: &str) -> (SessionData, LoadStatus) {
        match self.store.get(key).await {
            Ok(Some(raw)) if !raw.is_empty() => match parse_payload(&raw) {
                Ok(Some(data)) => (data, LoadStatus::Restored),
                Ok(None) => (SessionData::new(), LoadStatus::Missing),
                Err(reason) => {
                    warn!(operation = "get", key = %key, error = %reason, "Stored session payload is malformed");
                    (SessionData::new(), LoadStatus::Degraded(reason))
                }
            },
            Ok(_) => (SessionData::new(), LoadStatus::Missing),
            Err(e) => {
                warn!(operation = "get", key = %key, error = %e, "Failed to load session");
                (SessionData::new(), LoadStatus::Degraded(e.to_string()))
            }
        }
    }
}

/// `null` is treated as no record; anything but an object is malformed.
fn parse_payload(raw: &str) -> Result<Option<SessionData>, String> {
    match serde_json::from_str::<serde_json::Value>(raw).map_err(|e| e.to_string())? {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use serde_json::json;

    use super::*;
    use crate::cookie::testing::{FakeCookies, Written};
    use crate::cookie::CookieAttributes;
    use crate::error::StoreError;
    use crate::store::testing::MapStore;
    use crate::store::MockDatastore;

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    fn start(cookies: &Arc<FakeCookies>, store: Arc<dyn Datastore>, config: &SessionConfig) -> Session {
        Session::start(cookies.clone(), store, config).expect("valid configuration")
    }

    #[test]
    fn test_invalid_ttl_fails_before_touching_cookies() {
        for ttl in [59, 34_560_001] {
            let cookies = Arc::new(FakeCookies::default());
            let result = Session::start(
                cookies.clone(),
                Arc::new(MockDatastore::new()),
                &config().with_ttl(ttl),
            );
            assert!(matches!(result, Err(SessionError::InvalidTtl { .. })));
            assert!(cookies.written.lock().is_empty());
        }
    }

    #[test]
    fn test_valid_ttl_bounds_are_accepted() {
        for ttl in [60, 34_560_000] {
            let cookies = Arc::new(FakeCookies::default());
            assert!(Session::start(cookies, Arc::new(MockDatastore::new()), &config().with_ttl(ttl)).is_ok());
        }
    }

    #[tokio::test]
    async fn test_new_session_skips_datastore() {
        let cookies = Arc::new(FakeCookies::default());
        // No expectations: any datastore call panics.
        let session = start(&cookies, Arc::new(MockDatastore::new()), &config());
        assert!(session.is_new());

        let id = session.id().clone();
        let handle = session.load().await;
        assert_eq!(handle.id().len(), 64);
        assert!(handle.data().is_empty());
        assert_eq!(handle.load_status(), &LoadStatus::Fresh);
        assert_eq!(
            cookies.written("__session"),
            Some(Written::Set(id.to_string(), CookieAttributes::renewal(2_592_000)))
        );
    }

    #[tokio::test]
    async fn test_existing_session_reads_once() {
        let mut store = MockDatastore::new();
        store
            .expect_get()
            .with(eq("session:v"))
            .times(1)
            .returning(|_| Ok(Some(r#"{"a":1}"#.to_string())));

        let cookies = Arc::new(FakeCookies::with("__session", "v"));
        let handle = start(&cookies, Arc::new(store), &config()).load().await;

        assert_eq!(handle.id(), "v");
        assert!(!handle.is_new());
        assert_eq!(serde_json::Value::Object(handle.data()), json!({"a": 1}));
        assert_eq!(handle.load_status(), &LoadStatus::Restored);
        // Existing sessions still get the sliding refresh.
        assert!(matches!(cookies.written("__session"), Some(Written::Set(ref v, _)) if v == "v"));
    }

    #[tokio::test]
    async fn test_missing_record_is_empty() {
        let mut store = MockDatastore::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let cookies = Arc::new(FakeCookies::with("__session", "gone"));
        let handle = start(&cookies, Arc::new(store), &config()).load().await;
        assert!(handle.is_empty());
        assert_eq!(handle.load_status(), &LoadStatus::Missing);
    }

    #[tokio::test]
    async fn test_get_failure_is_swallowed() {
        let mut store = MockDatastore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".into())));

        let cookies = Arc::new(FakeCookies::with("__session", "v"));
        let handle = start(&cookies, Arc::new(store), &config()).load().await;
        assert!(handle.is_empty());
        assert!(matches!(handle.load_status(), LoadStatus::Degraded(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_swallowed() {
        for raw in ["{not json", "[1,2,3]", "42"] {
            let mut store = MockDatastore::new();
            store.expect_get().returning(move |_| Ok(Some(raw.to_string())));

            let cookies = Arc::new(FakeCookies::with("__session", "v"));
            let handle = start(&cookies, Arc::new(store), &config()).load().await;
            assert!(handle.is_empty(), "payload {:?} should fall back to empty", raw);
            assert!(matches!(handle.load_status(), LoadStatus::Degraded(_)));
        }
    }

    #[tokio::test]
    async fn test_null_and_empty_payloads_are_missing() {
        for raw in ["null", ""] {
            let mut store = MockDatastore::new();
            store.expect_get().returning(move |_| Ok(Some(raw.to_string())));

            let cookies = Arc::new(FakeCookies::with("__session", "v"));
            let handle = start(&cookies, Arc::new(store), &config()).load().await;
            assert!(handle.is_empty());
            assert_eq!(handle.load_status(), &LoadStatus::Missing);
        }
    }

    #[tokio::test]
    async fn test_save_writes_payload_with_ttl() {
        let mut store = MockDatastore::new();
        store
            .expect_put()
            .withf(|key, value, ttl| {
                key.starts_with("app:")
                    && serde_json::from_str::<serde_json::Value>(value).ok() == Some(json!({"x": 42}))
                    && *ttl == 3600
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let cookies = Arc::new(FakeCookies::default());
        let cfg = config().with_prefix("app").with_ttl(3600);
        let handle = start(&cookies, Arc::new(store), &cfg).load().await;
        handle.insert("x", 42).unwrap();
        assert!(handle.save().await.is_ok());
    }

    #[tokio::test]
    async fn test_save_failure_returns_error() {
        let mut store = MockDatastore::new();
        store
            .expect_put()
            .returning(|_, _, _| Err(StoreError::Backend("quota exceeded".into())));

        let cookies = Arc::new(FakeCookies::default());
        let handle = start(&cookies, Arc::new(store), &config()).load().await;
        let result = handle.save().await;
        assert!(matches!(result, Err(SessionError::Store(StoreError::Backend(_)))));
        assert!(!result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_round_trip_through_fresh_instance() {
        let store: Arc<dyn Datastore> = Arc::new(MapStore::default());

        let first = Arc::new(FakeCookies::default());
        let handle = start(&first, store.clone(), &config()).load().await;
        handle.with_data(|data| {
            data.insert("x".to_string(), json!(42));
        });
        handle.save().await.unwrap();

        let second = Arc::new(FakeCookies::with("__session", handle.id()));
        let reloaded = start(&second, store, &config()).load().await;
        assert_eq!(reloaded.id(), handle.id());
        assert_eq!(reloaded.get::<i64>("x"), Some(42));
        assert_eq!(serde_json::Value::Object(reloaded.data()), json!({"x": 42}));
    }

    #[tokio::test]
    async fn test_clones_share_payload() {
        let store: Arc<dyn Datastore> = Arc::new(MapStore::default());
        let cookies = Arc::new(FakeCookies::default());
        let handle = start(&cookies, store.clone(), &config()).load().await;

        let clone = handle.clone();
        clone.insert("seen", true).unwrap();
        handle.save().await.unwrap();

        let raw = store.get(handle.key()).await.unwrap().unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&raw).unwrap(), json!({"seen": true}));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let store = Arc::new(MapStore::default());
        store.put("session:v", r#"{"a":1}"#, 60).await.unwrap();

        let cookies = Arc::new(FakeCookies::with("__session", "v"));
        let handle = start(&cookies, store.clone(), &config()).load().await;
        assert!(!handle.is_empty());

        assert!(handle.destroy().await.is_ok());
        assert!(handle.is_empty());
        assert!(handle.is_deleted());
        assert_eq!(cookies.written("__session"), Some(Written::Deleted(CookieAttributes::removal())));
        assert_eq!(store.get("session:v").await.unwrap(), None);

        assert!(handle.destroy().await.is_ok());
        assert!(handle.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_failure_still_clears_locally() {
        let mut store = MockDatastore::new();
        store.expect_get().returning(|_| Ok(Some(r#"{"a":1}"#.to_string())));
        store
            .expect_delete()
            .times(2)
            .returning(|_| Err(StoreError::Unavailable("timeout".into())));

        let cookies = Arc::new(FakeCookies::with("__session", "v"));
        let handle = start(&cookies, Arc::new(store), &config()).load().await;
        assert!(handle.destroy().await.is_err());
        assert!(handle.destroy().await.is_err());
        assert!(handle.is_empty());
        assert!(matches!(cookies.written("__session"), Some(Written::Deleted(_))));
    }

    #[tokio::test]
    async fn test_save_after_destroy_is_rejected() {
        let mut store = MockDatastore::new();
        store.expect_delete().times(1).returning(|_| Ok(()));
        // No put expectation: a write after destroy would panic.

        let cookies = Arc::new(FakeCookies::default());
        let handle = start(&cookies, Arc::new(store), &config()).load().await;
        handle.destroy().await.unwrap();
        handle.insert("late", 1).unwrap();
        assert_eq!(handle.save().await, Err(SessionError::Destroyed));
    }

    #[tokio::test]
    async fn test_on_save_renewal_defers_cookie() {
        let store: Arc<dyn Datastore> = Arc::new(MapStore::default());
        let cookies = Arc::new(FakeCookies::default());
        let cfg = config().with_cookie_renewal(CookieRenewal::OnSave).with_ttl(600);

        let handle = start(&cookies, store, &cfg).load().await;
        assert_eq!(cookies.written("__session"), None);

        handle.save().await.unwrap();
        assert_eq!(
            cookies.written("__session"),
            Some(Written::Set(handle.id().to_string(), CookieAttributes::renewal(600)))
        );
    }

    #[tokio::test]
    async fn test_on_save_renewal_skips_cookie_when_save_fails() {
        let mut store = MockDatastore::new();
        store
            .expect_put()
            .returning(|_, _, _| Err(StoreError::Unavailable("down".into())));

        let cookies = Arc::new(FakeCookies::default());
        let cfg = config().with_cookie_renewal(CookieRenewal::OnSave);
        let handle = start(&cookies, Arc::new(store), &cfg).load().await;
        assert!(handle.save().await.is_err());
        assert_eq!(cookies.written("__session"), None);
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload("{}").unwrap(), Some(SessionData::new()));
        assert_eq!(parse_payload("null").unwrap(), None);
        assert!(parse_payload("\"text\"").unwrap_err().contains("string"));
    }
}
