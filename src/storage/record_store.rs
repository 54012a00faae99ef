//! Record store: the single owner of the `data` table.
//!
//! Every operation passes through one [`RwLock`] gate. Under the default
//! [`LockPolicy::Exclusive`] each call takes the write side, so reads and
//! writes are totally ordered and run on a single connection. Under
//! [`LockPolicy::SharedRead`] reads share the gate and run in parallel on a
//! connection pool, while writes still hold it exclusively.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;
use crate::storage::schema::{init_schema, verify_schema};
use crate::storage::types::{NewRecord, Record, RecordRow};

/// How read operations acquire the store gate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LockPolicy {
    /// Reads and writes are fully serialized on one connection.
    #[default]
    Exclusive,
    /// Reads run concurrently on a pool; writes remain exclusive.
    SharedRead,
}

enum Guard<'a> {
    Shared { _guard: RwLockReadGuard<'a, ()> },
    Exclusive { _guard: RwLockWriteGuard<'a, ()> },
}

/// Durable, thread-safe record storage backed by SQLite.
pub struct RecordStore {
    pool: SqlitePool,
    gate: RwLock<()>,
    policy: LockPolicy,
    path: PathBuf,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Open or create the store at `path`.
    ///
    /// The schema is created when the file did not exist beforehand and is
    /// verified on every open, so a foreign or damaged file fails here.
    ///
    /// `pool_size` only applies to [`LockPolicy::SharedRead`]; the exclusive
    /// policy always uses a single connection.
    pub async fn open(
        path: impl AsRef<Path>,
        policy: LockPolicy,
        pool_size: u32,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let existed = path.exists();

        let max_connections = match policy {
            LockPolicy::Exclusive => 1,
            LockPolicy::SharedRead => pool_size.max(1),
        };

        let pool = SqlitePool::open(path, max_connections)
            .await
            .map_err(|e| StorageError::Unavailable {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        if !existed {
            tracing::info!(path = %path.display(), "Creating database schema");
            init_schema(pool.inner()).await?;
        }
        verify_schema(pool.inner()).await?;

        tracing::debug!(path = %path.display(), %policy, max_connections, "Record store opened");

        Ok(Self {
            pool,
            gate: RwLock::new(()),
            policy,
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active lock policy.
    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    async fn read_guard(&self) -> Guard<'_> {
        match self.policy {
            LockPolicy::Exclusive => Guard::Exclusive {
                _guard: self.gate.write().await,
            },
            LockPolicy::SharedRead => Guard::Shared {
                _guard: self.gate.read().await,
            },
        }
    }

    /// Insert a record and return its assigned id.
    ///
    /// The size column is taken from the payload length.
    pub async fn write(&self, record: &NewRecord) -> Result<i64, StorageError> {
        let _guard = self.gate.write().await;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO data (timestamp, from_addr, packet_size, payload)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(record.timestamp.timestamp_micros())
        .bind(record.source_address.as_str())
        .bind(record.size() as i64)
        .bind(record.payload.as_slice())
        .fetch_one(self.pool.inner())
        .await
        .map_err(StorageError::Write)?;

        Ok(id)
    }

    /// Fetch one record by id.
    pub async fn get(&self, id: i64) -> Result<Record, StorageError> {
        let _guard = self.read_guard().await;

        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, timestamp, from_addr, packet_size, payload FROM data WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Record::from).ok_or(StorageError::NotFound(id))
    }

    /// List records newest first, skipping `offset` and returning at most `limit`.
    ///
    /// Values are handed to SQLite unchanged; see
    /// [`ListQuery`](crate::storage::ListQuery) for normalization.
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Record>, StorageError> {
        let _guard = self.read_guard().await;

        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT id, timestamp, from_addr, packet_size, payload FROM data
             ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let _guard = self.read_guard().await;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM data")
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }

    /// Close the underlying pool. Subsequent operations fail.
    pub async fn close(&self) {
        let _guard = self.gate.write().await;
        self.pool.close().await;
    }
}
