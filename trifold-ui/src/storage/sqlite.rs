//! SQLite history store
//!
//! Normalized layout over two tables: one `history` row per query and
//! up to three `responses` rows keyed by (history_id, position).
//! Ratings live as nullable 0/1 columns on the response row, so a
//! single rating flip is one UPDATE.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use trifold_common::model::{AiResponse, HistoryItem, Provider, Rating, RatingCategory};
use trifold_common::{Error, Result};

/// History store backed by the history/responses tables.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Flat row shape shared by the response queries
type ResponseRow = (
    String,         // history_id
    i64,            // position
    String,         // provider
    String,         // model
    String,         // text
    i64,            // latency_ms
    Option<String>, // error
    Option<bool>,   // accuracy
    Option<bool>,   // relevance
    Option<bool>,   // completeness
    Option<bool>,   // concise
    Option<bool>,   // unbiased
);

const RESPONSE_COLUMNS: &str = "history_id, position, provider, model, text, latency_ms, error, \
     accuracy, relevance, completeness, concise, unbiased";

fn response_from_row(row: ResponseRow) -> Result<AiResponse> {
    let provider: Provider = row.2.parse()?;
    Ok(AiResponse {
        provider,
        model: row.3,
        text: row.4,
        latency_ms: row.5,
        error: row.6,
        rating: Rating {
            accuracy: row.7,
            relevance: row.8,
            completeness: row.9,
            concise: row.10,
            unbiased: row.11,
        },
    })
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All history items, newest first.
    pub async fn list(&self) -> Result<Vec<HistoryItem>> {
        let items: Vec<(String, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, query, created_at FROM history ORDER BY created_at DESC, id")
                .fetch_all(&self.pool)
                .await?;

        let rows: Vec<ResponseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM responses ORDER BY history_id, position",
            RESPONSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_item: HashMap<String, Vec<AiResponse>> = HashMap::new();
        for row in rows {
            let history_id = row.0.clone();
            by_item.entry(history_id).or_default().push(response_from_row(row)?);
        }

        Ok(items
            .into_iter()
            .map(|(id, query, created_at)| {
                let responses = by_item.remove(&id).unwrap_or_default();
                HistoryItem {
                    id,
                    query,
                    created_at,
                    responses,
                }
            })
            .collect())
    }

    /// One item by id.
    pub async fn get(&self, id: &str) -> Result<Option<HistoryItem>> {
        let row: Option<(String, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, query, created_at FROM history WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let (id, query, created_at) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let rows: Vec<ResponseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM responses WHERE history_id = ? ORDER BY position",
            RESPONSE_COLUMNS
        ))
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let responses = rows
            .into_iter()
            .map(response_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(HistoryItem {
            id,
            query,
            created_at,
            responses,
        }))
    }

    /// Whether an item with this id exists.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM history WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Number of stored items.
    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Insert or replace one item, rewriting its responses.
    pub async fn upsert(&self, item: &HistoryItem) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO history (id, query, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET query = excluded.query, created_at = excluded.created_at",
        )
        .bind(&item.id)
        .bind(&item.query)
        .bind(item.created_at)
        .execute(&mut *tx)
        .await?;

        // Replacing the full response set keeps positions dense
        sqlx::query("DELETE FROM responses WHERE history_id = ?")
            .bind(&item.id)
            .execute(&mut *tx)
            .await?;

        for (position, response) in item.responses.iter().enumerate() {
            sqlx::query(&format!(
                "INSERT INTO responses ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                RESPONSE_COLUMNS
            ))
            .bind(&item.id)
            .bind(position as i64)
            .bind(response.provider.as_str())
            .bind(&response.model)
            .bind(&response.text)
            .bind(response.latency_ms)
            .bind(response.error.as_deref())
            .bind(response.rating.accuracy)
            .bind(response.rating.relevance)
            .bind(response.rating.completeness)
            .bind(response.rating.concise)
            .bind(response.rating.unbiased)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete one item; reports whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        // Explicit two-step delete does not depend on the foreign-key
        // pragma being active on this connection
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM responses WHERE history_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM history WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every item.
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM responses").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM history").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Set one rating category on one response.
    ///
    /// A `value` of None returns the category to unknown.
    pub async fn set_rating(
        &self,
        id: &str,
        response_index: usize,
        category: RatingCategory,
        value: Option<bool>,
    ) -> Result<()> {
        // Column name comes from the category enum, never from raw input
        let sql = format!(
            "UPDATE responses SET {} = ? WHERE history_id = ? AND position = ?",
            category.as_str()
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .bind(response_index as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            if self.exists(id).await? {
                return Err(Error::InvalidInput(format!(
                    "response index {} out of range",
                    response_index
                )));
            }
            return Err(Error::NotFound(format!("history item {}", id)));
        }

        Ok(())
    }
}
