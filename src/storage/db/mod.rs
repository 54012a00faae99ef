//! Database backend for the record store.
//!
//! - `SqlitePool`: Connection pool wrapper for SQLite
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::open(Path::new("packetlog.db"), 1).await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::SqlitePool;
