//! User-facing storage facades.
//!
//! - `RecordWriter`: Insert records (ingestion side)
//! - `RecordReader`: Fetch and page through records (query side)
//! - `ListQuery`: Normalized pagination parameters

use std::sync::Arc;

use crate::storage::StorageError;
use crate::storage::record_store::RecordStore;
use crate::storage::types::{NewRecord, Record};

// =============================================================================
// Constants
// =============================================================================

/// Offset used when none (or an invalid one) is given.
pub const DEFAULT_OFFSET: i64 = 0;

/// Page size used when none (or an invalid one) is given.
pub const DEFAULT_LIMIT: i64 = 10;

// =============================================================================
// Query Types
// =============================================================================

/// Pagination for [`RecordReader::list`].
///
/// Construction normalizes the values: a negative offset becomes
/// [`DEFAULT_OFFSET`] and a non-positive limit becomes [`DEFAULT_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    offset: i64,
    limit: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: if offset < 0 { DEFAULT_OFFSET } else { offset },
            limit: if limit <= 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Build from raw request parameters; anything unparsable falls back to defaults.
    pub fn from_params(offset: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |value: Option<&str>, default: i64| {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };
        Self::new(parse(offset, DEFAULT_OFFSET), parse(limit, DEFAULT_LIMIT))
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Record writer used by the ingestion loop.
///
/// Each call waits for the insert to commit before returning.
#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<RecordStore>,
}

impl std::fmt::Debug for RecordWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter").finish_non_exhaustive()
    }
}

impl RecordWriter {
    pub(crate) fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Persist a record, returning its id.
    pub async fn write(&self, record: &NewRecord) -> Result<i64, StorageError> {
        self.store.write(record).await
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Read-only access to stored records.
#[derive(Clone)]
pub struct RecordReader {
    store: Arc<RecordStore>,
}

impl std::fmt::Debug for RecordReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordReader").finish_non_exhaustive()
    }
}

impl RecordReader {
    pub(crate) fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch a single record.
    pub async fn get(&self, id: i64) -> Result<Record, StorageError> {
        self.store.get(id).await
    }

    /// Page through records, newest first.
    pub async fn list(&self, query: ListQuery) -> Result<Vec<Record>, StorageError> {
        self.store.list(query.offset, query.limit).await
    }

    /// Total number of records.
    pub async fn count(&self) -> Result<i64, StorageError> {
        self.store.count().await
    }
}
