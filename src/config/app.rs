//! Application configuration structures.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ingest::{DEFAULT_BUFFER_SIZE, ListenerConfig, MAX_BUFFER_SIZE};
use crate::storage::{DEFAULT_POOL_SIZE, LockPolicy};

use super::validation::{ConfigError, parse_listen_addr};

// =============================================================================
// Constants
// =============================================================================

/// Default web server listen address.
pub const DEFAULT_SERVER_LISTEN: &str = ":8008";

/// Default static file directory.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default UDP listen address.
pub const DEFAULT_UDP_LISTEN: &str = ":7000";

/// Default database file.
pub const DEFAULT_DB_PATH: &str = "packetlog.db";

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `[host]:port` (default: ":8008").
    pub listen: String,

    /// Directory served for non-API paths (default: "static").
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_SERVER_LISTEN.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
        }
    }
}

// =============================================================================
// Ingest Configuration
// =============================================================================

/// UDP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Listen address, `[host]:port` (default: ":7000").
    pub listen: String,

    /// Receive buffer size in bytes (default: 1024).
    pub buffer_size: usize,

    /// Log every stored record (default: false).
    pub verbose: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_UDP_LISTEN.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            verbose: false,
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,

    /// How reads share the store lock (default: exclusive).
    pub lock_policy: LockPolicy,

    /// Reader pool size, used by `shared_read` only (default: 4).
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            lock_policy: LockPolicy::default(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// UDP listener configuration.
    pub ingest: IngestConfig,

    /// Database configuration.
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// Values are not validated here; call [`AppConfig::validate`] once any
    /// command-line overrides have been applied.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_addr()?;
        self.udp_addr()?;

        if self.ingest.buffer_size == 0 || self.ingest.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "ingest buffer_size must be between 1 and {MAX_BUFFER_SIZE}"
            )));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database path must not be empty".to_string(),
            ));
        }

        if self.database.pool_size == 0 {
            return Err(ConfigError::ValidationError(
                "database pool_size must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved web server address.
    pub fn server_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen_addr(&self.server.listen)
            .map_err(|e| ConfigError::ValidationError(format!("server listen: {e}")))
    }

    /// Resolved UDP listener address.
    pub fn udp_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen_addr(&self.ingest.listen)
            .map_err(|e| ConfigError::ValidationError(format!("ingest listen: {e}")))
    }

    /// Listener settings derived from the ingest section.
    pub fn listener_config(&self) -> Result<ListenerConfig, ConfigError> {
        Ok(ListenerConfig::new(self.udp_addr()?)
            .with_buffer_size(self.ingest.buffer_size)
            .with_verbose(self.ingest.verbose))
    }
}
