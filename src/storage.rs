//! Storage Layer
//!
//! SQLite persistence for received datagrams behind a single lock:
//! - **Writer**: Inserts records, one at a time, under the exclusive lock
//! - **Reader**: Point and page reads, serialized or shared per [`LockPolicy`]
//!
//! # Components
//!
//! - [`RecordStore`]: Owns the `data` table and the lock
//! - [`RecordWriter`] / [`RecordReader`]: Cloneable facades over the store
//! - [`StorageBuilder`] / [`StorageHandles`]: Initialization and lifecycle management

mod builder;
pub mod db;
mod error;
mod facades;
mod record_store;
mod schema;
mod types;

pub use builder::{DEFAULT_POOL_SIZE, StorageBuilder, StorageHandles};
pub use error::StorageError;
pub use facades::{DEFAULT_LIMIT, DEFAULT_OFFSET, ListQuery, RecordReader, RecordWriter};
pub use record_store::{LockPolicy, RecordStore};
pub use types::{NewRecord, Record};
