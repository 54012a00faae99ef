//! Configuration module for packetlog.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (listen address, static directory)
//! - Ingest settings (UDP listen address, buffer size, verbose logging)
//! - Database settings (path, lock policy, pool size)

mod app;
mod validation;

pub use app::{AppConfig, DatabaseConfig, IngestConfig, ServerConfig};
pub use validation::{ConfigError, parse_listen_addr};

// Re-export constants
pub use app::{
    DEFAULT_DB_PATH, DEFAULT_SERVER_LISTEN, DEFAULT_STATIC_DIR,
    DEFAULT_UDP_LISTEN,
};
