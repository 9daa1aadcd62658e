//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `budgetdesk.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.
//!
//! Connection strings are keyed `"{context}.{provider}"`; the application
//! context is [`APP_CONTEXT`], so the `SQLite` URL lives under `App.Sqlite`.

use std::collections::BTreeMap;
use std::time::Duration;

use budgetdesk_app::cache::{CacheConfig, MAX_TTL};
use budgetdesk_app::mediator::DEFAULT_SLOW_REQUEST_THRESHOLD;
use serde::Deserialize;

/// Name of the only database context.
pub const APP_CONTEXT: &str = "App";

/// The only supported database provider.
pub const SQLITE_PROVIDER: &str = "Sqlite";

const DEFAULT_DATABASE_URL: &str = "sqlite:budgetdesk.db?mode=rwc";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database provider selection.
    pub database: DatabaseConfig,
    /// Connection strings keyed `"{context}.{provider}"`.
    pub connection_strings: BTreeMap<String, String>,
    /// Logging settings.
    pub logging: LoggingConfig,
    pub cache: CacheSection,
    pub mediator: MediatorSection,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Provider name; picks the connection string for [`APP_CONTEXT`].
    pub provider: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Cache provider tunables, in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub default_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MediatorSection {
    /// Requests slower than this are logged as warnings.
    pub slow_request_ms: u64,
}

impl Config {
    /// Load configuration from `budgetdesk.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("budgetdesk.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BUDGETDESK_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("BUDGETDESK_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("BUDGETDESK_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("BUDGETDESK_DB_PROVIDER") {
            self.database.provider = val;
        }
        if let Ok(val) = std::env::var("BUDGETDESK_DATABASE_URL") {
            self.connection_strings.insert(self.connection_key(), val);
        }
        if let Ok(val) = std::env::var("BUDGETDESK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.cache.default_ttl_secs == 0 || self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "cache durations must be non-zero".to_string(),
            ));
        }
        let max = MAX_TTL.as_secs();
        if self.cache.default_ttl_secs > max || self.cache.sweep_interval_secs > max {
            return Err(ConfigError::Validation(format!(
                "cache durations must not exceed {max} seconds"
            )));
        }
        self.database_url()?;
        Ok(())
    }

    fn connection_key(&self) -> String {
        format!("{APP_CONTEXT}.{}", self.database.provider)
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Connection string of the application context for the configured
    /// provider. Falls back to a local file for `Sqlite`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedProvider`] for any provider other
    /// than [`SQLITE_PROVIDER`].
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        if !self.database.provider.eq_ignore_ascii_case(SQLITE_PROVIDER) {
            return Err(ConfigError::UnsupportedProvider(
                self.database.provider.clone(),
            ));
        }
        let key = self.connection_key();
        Ok(self
            .connection_strings
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
            .map_or(DEFAULT_DATABASE_URL, |(_, url)| url.as_str()))
    }

    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_secs(self.cache.default_ttl_secs),
            sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs),
        }
    }

    #[must_use]
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.mediator.slow_request_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: SQLITE_PROVIDER.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "budgetdeskd=info,budgetdesk=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            default_ttl_secs: defaults.default_ttl.as_secs(),
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
        }
    }
}

impl Default for MediatorSection {
    fn default() -> Self {
        Self {
            slow_request_ms: u64::try_from(DEFAULT_SLOW_REQUEST_THRESHOLD.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Only `Sqlite` is wired in.
    #[error("unsupported database provider '{0}'")]
    UnsupportedProvider(String),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
