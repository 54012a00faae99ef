//! Database schema definition and verification.

use sqlx::SqlitePool;

use crate::storage::StorageError;

/// Name of the single records table.
pub const DATA_TABLE: &str = "data";

/// Columns the store reads and writes, in table order.
pub const DATA_COLUMNS: [&str; 5] = ["id", "timestamp", "from_addr", "packet_size", "payload"];

/// SQL statement for creating the `data` table.
///
/// `AUTOINCREMENT` keeps ids strictly increasing and never reused.
/// Timestamps are stored as unix microseconds.
pub const DATA_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS data (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp    INTEGER NOT NULL,
    from_addr    TEXT NOT NULL,
    packet_size  INTEGER NOT NULL,
    payload      BLOB NOT NULL
)
"#;

/// Create the schema on a fresh database.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(DATA_TABLE_DDL)
        .execute(pool)
        .await
        .map_err(StorageError::SchemaInit)?;

    tracing::info!("Database schema initialized");
    Ok(())
}

/// Check that the `data` table exists with every expected column.
pub async fn verify_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
            .bind(DATA_TABLE)
            .fetch_all(pool)
            .await?;

    if columns.is_empty() {
        return Err(StorageError::SchemaInvalid(format!(
            "table '{DATA_TABLE}' not found"
        )));
    }

    if let Some(missing) = DATA_COLUMNS
        .iter()
        .find(|expected| !columns.iter().any(|c| c == *expected))
    {
        return Err(StorageError::SchemaInvalid(format!(
            "table '{DATA_TABLE}' is missing column '{missing}'"
        )));
    }

    Ok(())
}
