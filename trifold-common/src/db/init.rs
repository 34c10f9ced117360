//! Database initialization
//!
//! Creates the SQLite database on first run, applies connection
//! pragmas, creates missing tables, and seeds default settings. Safe
//! to call repeatedly; existing data is never touched.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::Result;

/// Initialize the database connection pool and schema.
///
/// Creates the database file (and parent directories) when missing.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Created new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Foreign keys are off by default in SQLite; the responses table
    // relies on cascade delete
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a write is in progress
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Wait up to 5 seconds on a locked database instead of failing
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_settings_table(&pool).await?;
    create_history_table(&pool).await?;
    create_responses_table(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create the settings key-value table if it doesn't exist
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    debug!("Settings table ready");
    Ok(())
}

/// Create the history table if it doesn't exist
pub async fn create_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            id TEXT PRIMARY KEY NOT NULL,
            query TEXT NOT NULL CHECK(length(query) > 0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at)")
        .execute(pool)
        .await?;

    debug!("History table ready");
    Ok(())
}

/// Create the responses table if it doesn't exist.
///
/// One row per provider response, keyed by (history_id, position)
/// with position 0..2. Rating columns are nullable 0/1: NULL means
/// the category has not been rated.
pub async fn create_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responses (
            history_id TEXT NOT NULL,
            position INTEGER NOT NULL CHECK(position >= 0 AND position < 3),
            provider TEXT NOT NULL CHECK(provider IN ('openai', 'anthropic', 'gemini')),
            model TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            latency_ms INTEGER NOT NULL DEFAULT 0,
            error TEXT,
            accuracy INTEGER CHECK(accuracy IN (0, 1)),
            relevance INTEGER CHECK(relevance IN (0, 1)),
            completeness INTEGER CHECK(completeness IN (0, 1)),
            concise INTEGER CHECK(concise IN (0, 1)),
            unbiased INTEGER CHECK(unbiased IN (0, 1)),
            PRIMARY KEY (history_id, position),
            FOREIGN KEY (history_id) REFERENCES history(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_responses_history ON responses(history_id)")
        .execute(pool)
        .await?;

    debug!("Responses table ready");
    Ok(())
}

/// Initialize or repair default settings.
///
/// Ensures every required setting exists and resets NULL values back
/// to their defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Active history store: 'database' (SQLite) or 'archive' (JSON file)
    ensure_setting(pool, "storage_backend", "database").await?;

    // Per-provider request timeout for the ask fan-out
    ensure_setting(pool, "ask_timeout_ms", "30000").await?;

    debug!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with a non-NULL value.
///
/// Inserts the default when the key is missing and resets the value
/// when it exists but is NULL. Existing non-NULL values are kept.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?;

    let is_null: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ? AND value IS NULL)")
            .bind(key)
            .fetch_one(pool)
            .await?;

    if is_null {
        warn!(
            "Setting '{}' was NULL, resetting to default '{}'",
            key, default_value
        );
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;
    }

    Ok(())
}
