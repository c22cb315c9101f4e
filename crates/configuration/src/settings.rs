use crate::error::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

/// Where and how the HTTP API listens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IP address to bind; hostnames are not resolved.
    pub host: String,
    pub port: u16,
    /// Accept cross-origin requests from any origin (the browser frontend
    /// is served from a different port during development).
    pub cors_allow_any: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allow_any: true,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server host '{}': {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Connection pool settings. The connection string itself is read from
/// `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Apply pending migrations when the pool is opened.
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "trade-diary.log".to_string(),
        }
    }
}

impl Config {
    /// Checks the values that deserialization alone cannot reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must not be 0".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.acquire_timeout_secs must be at least 1".to_string(),
            ));
        }
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ConfigError::ValidationError(format!("logging.level '{}' is not a valid filter: {}", self.logging.level, e))
        })?;
        if self.logging.directory.is_some() && self.logging.file_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.file_prefix must not be empty when logging.directory is set".to_string(),
            ));
        }
        Ok(())
    }
}
