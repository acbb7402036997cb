//! Configuration management

use config::{Config, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_DATASTORE_BINDING, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECONDS,
    TTL_MAX_SECONDS, TTL_MIN_SECONDS,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone, Validate)]
#[validate(schema(function = "validate_session_binding"))]
pub struct AppConfig {
    #[validate(nested)]
    pub app: AppSettings,
    #[validate(nested)]
    pub session: SessionSettings,
    #[serde(default)]
    #[validate(nested)]
    pub datastores: Vec<DatastoreSettings>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppSettings {
    pub env: String,
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct SessionSettings {
    #[validate(length(min = 1, message = "cookie name must not be empty"))]
    pub cookie_name: String,
    #[validate(length(min = 1, message = "key prefix must not be empty"))]
    pub prefix: String,
    #[validate(range(min = TTL_MIN_SECONDS, max = TTL_MAX_SECONDS, code = "invalid_ttl"))]
    pub ttl: u64,
    #[validate(length(min = 1))]
    pub datastore: String,
    #[serde(default)]
    pub cookie_renewal: CookieRenewal,
}

/// When the session cookie's Max-Age is pushed forward.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CookieRenewal {
    /// Re-issue the cookie on every request (sliding expiration).
    #[default]
    EveryRequest,
    /// Re-issue the cookie only after a successful save, so it expires together with the record.
    OnSave,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreKind {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone, Validate)]
#[validate(schema(function = "validate_datastore"))]
pub struct DatastoreSettings {
    #[validate(length(min = 1, message = "binding name must not be empty"))]
    pub binding: String,
    pub kind: DatastoreKind,
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_max_connections() -> usize {
    16
}

fn default_sweep_interval() -> u64 {
    60
}

fn validate_datastore(settings: &DatastoreSettings) -> Result<(), ValidationError> {
    if settings.kind == DatastoreKind::Redis && settings.url.as_deref().unwrap_or("").is_empty() {
        return Err(ValidationError::new("redis_url_required"));
    }
    Ok(())
}

/// The session binding must name a declared datastore; a typo must not start the server.
fn validate_session_binding(config: &AppConfig) -> Result<(), ValidationError> {
    let binding = &config.session.datastore;
    if config.datastores.iter().any(|d| &d.binding == binding) {
        return Ok(());
    }
    Err(ValidationError::new("datastore_not_found")
        .with_message(format!("Session datastore {} was not found.", binding).into()))
}

impl DatastoreSettings {
    pub fn memory(binding: &str) -> Self {
        Self {
            binding: binding.to_string(),
            kind: DatastoreKind::Memory,
            url: None,
            max_connections: default_max_connections(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "session-server")?
            .set_default("session.cookie_name", DEFAULT_COOKIE_NAME)?
            .set_default("session.prefix", DEFAULT_KEY_PREFIX)?
            .set_default("session.ttl", DEFAULT_TTL_SECONDS)?
            .set_default("session.datastore", DEFAULT_DATASTORE_BINDING)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__").try_parsing(true))
            .build()?;

        let mut loaded: AppConfig = config.try_deserialize()?;
        loaded.default_datastores();
        loaded.validate()?;
        Ok(loaded)
    }

    /// Without any `[[datastores]]` section the session binding gets an
    /// in-memory store. Declared sections are never extended.
    fn default_datastores(&mut self) {
        if self.datastores.is_empty() {
            tracing::warn!(
                binding = %self.session.datastore,
                "No datastores configured, using in-memory store"
            );
            self.datastores.push(DatastoreSettings::memory(&self.session.datastore));
        }
    }
}
