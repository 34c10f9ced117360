//! Settings database operations
//!
//! Typed accessors over the settings key-value table. Values are
//! stored as TEXT and parsed on read; a missing or unparseable value
//! falls back to the documented default.

use sqlx::{Pool, Sqlite};
use trifold_common::model::StorageBackend;
use trifold_common::Result;

/// Get the active history storage backend.
///
/// Defaults to the SQLite database when unset.
pub async fn get_storage_backend(db: &Pool<Sqlite>) -> Result<StorageBackend> {
    Ok(get_setting(db, "storage_backend")
        .await?
        .unwrap_or(StorageBackend::Database))
}

/// Persist the active history storage backend
pub async fn set_storage_backend(db: &Pool<Sqlite>, backend: StorageBackend) -> Result<()> {
    set_setting(db, "storage_backend", backend).await
}

/// Get the per-provider request timeout in milliseconds.
///
/// Defaults to 30 seconds when unset.
pub async fn get_ask_timeout_ms(db: &Pool<Sqlite>) -> Result<u64> {
    Ok(get_setting(db, "ask_timeout_ms").await?.unwrap_or(30_000))
}

/// Generic setting getter.
///
/// Returns None when the key is missing, the value is NULL, or the
/// value fails to parse as T.
async fn get_setting<T: std::str::FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    Ok(value.flatten().and_then(|v| v.parse().ok()))
}

/// Generic setting setter. Inserts or updates the key.
async fn set_setting<T: std::fmt::Display>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}
