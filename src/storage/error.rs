//! Storage-specific error types.
//!
//! All storage operations return [`StorageError`] on failure. Startup errors
//! (`Unavailable`, `SchemaInit`, `SchemaInvalid`) are fatal; `Write` and
//! `NotFound` are per-operation and never poison the store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be opened or created.
    #[error("storage unavailable at '{}': {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Schema creation failed on a fresh database file.
    #[error("schema initialization failed: {0}")]
    SchemaInit(#[source] sqlx::Error),

    /// The database exists but does not carry the expected schema.
    #[error("invalid schema: {0}")]
    SchemaInvalid(String),

    /// Inserting a record failed; nothing was persisted.
    #[error("write failed: {0}")]
    Write(#[source] sqlx::Error),

    /// No record with the requested id.
    #[error("record {0} not found")]
    NotFound(i64),

    /// Read query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether this error means the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
