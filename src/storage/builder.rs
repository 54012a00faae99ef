//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing the storage facades.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::storage::record_store::{LockPolicy, RecordStore};
use crate::storage::{RecordReader, RecordWriter, StorageError};

/// Default reader pool size, used by [`LockPolicy::SharedRead`] only.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    db_path: PathBuf,
    lock_policy: LockPolicy,
    pool_size: u32,
}

impl StorageBuilder {
    /// Create a new storage builder with the exclusive lock policy.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            lock_policy: LockPolicy::default(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Set how reads acquire the store lock.
    pub fn lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Set the reader pool size (shared-read policy only).
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Build the storage layer and return handles.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Unavailable {
                path: self.db_path.clone(),
                source: Box::new(e),
            })?;
        }

        let store = Arc::new(
            RecordStore::open(&self.db_path, self.lock_policy, self.pool_size).await?,
        );

        Ok(StorageHandles {
            writer: RecordWriter::new(Arc::clone(&store)),
            reader: RecordReader::new(Arc::clone(&store)),
            store,
        })
    }
}

/// Handles to the storage layer facades.
pub struct StorageHandles {
    /// Writer facade for the ingestion loop.
    pub writer: RecordWriter,
    /// Reader facade for the query API.
    pub reader: RecordReader,
    store: Arc<RecordStore>,
}

impl StorageHandles {
    /// Backing file path.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Active lock policy.
    pub fn lock_policy(&self) -> LockPolicy {
        self.store.policy()
    }

    /// Close the database.
    ///
    /// Waits for in-flight operations to release the store lock first.
    pub async fn shutdown(self) -> Result<(), StorageError> {
        self.store.close().await;
        tracing::info!(path = %self.store.path().display(), "Storage closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ListQuery, NewRecord};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_storage_builder_roundtrip() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("builder.db");

        let handles = StorageBuilder::new(&db_path).build().await.unwrap();
        assert_eq!(handles.lock_policy(), LockPolicy::Exclusive);
        assert_eq!(handles.path(), db_path.as_path());

        for i in 0..5u8 {
            handles
                .writer
                .write(&NewRecord::received("127.0.0.1:9", vec![i]))
                .await
                .unwrap();
        }

        let records = handles.reader.list(ListQuery::new(0, 3)).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].payload, vec![4]);
        assert_eq!(handles.reader.count().await.unwrap(), 5);

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_storage_builder_shared_read() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("shared.db"))
            .lock_policy(LockPolicy::SharedRead)
            .pool_size(3)
            .build()
            .await
            .unwrap();
        assert_eq!(handles.lock_policy(), LockPolicy::SharedRead);

        let id = handles
            .writer
            .write(&NewRecord::received("127.0.0.1:9", b"x".to_vec()))
            .await
            .unwrap();
        assert_eq!(handles.reader.get(id).await.unwrap().payload, b"x");

        handles.shutdown().await.unwrap();
    }

    #[test]
    fn test_builder_defaults() {
        let builder = StorageBuilder::new("defaults.db");
        assert_eq!(builder.lock_policy, LockPolicy::Exclusive);
        assert_eq!(builder.pool_size, DEFAULT_POOL_SIZE);
    }
}
