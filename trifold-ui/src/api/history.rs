//! History CRUD endpoints
//!
//! Items are addressed by id via query parameters. Every route also
//! accepts an optional `backend` parameter to target a specific store
//! for that one request; without it the persisted selection applies.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use trifold_common::model::{AiResponse, HistoryItem, StorageBackend};
use uuid::Uuid;

use crate::api::storage::resolve_backend;
use crate::api::AckResponse;
use crate::error::{ApiJson, ApiQuery};
use crate::storage::MAX_RESPONSES;
use crate::{ApiError, ApiResult, AppState};

/// Common query parameters for history routes.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub id: Option<String>,
    pub backend: Option<StorageBackend>,
}

fn require_id(id: Option<String>) -> ApiResult<String> {
    id.ok_or_else(|| ApiError::BadRequest("missing id parameter".to_string()))
}

fn validate_item(query: &str, responses: &[AiResponse]) -> ApiResult<()> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    if responses.len() > MAX_RESPONSES {
        return Err(ApiError::BadRequest(format!(
            "at most {} responses per history item",
            MAX_RESPONSES
        )));
    }
    Ok(())
}

/// GET /api/history?id=...
///
/// Errors:
/// - 400: missing id parameter
/// - 404: no item with this id
pub async fn get_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<HistoryItem>> {
    let backend = resolve_backend(&state, params.backend).await?;
    let id = require_id(params.id)?;

    match state.stores.get(backend, &id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::NotFound(format!("history item {}", id))),
    }
}

/// GET /api/history/all
pub async fn get_all_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<HistoryItem>>> {
    let backend = resolve_backend(&state, params.backend).await?;
    Ok(Json(state.stores.list(backend).await?))
}

/// Request payload for POST /api/history
///
/// `id` and `created_at` are optional; the server fills them in.
#[derive(Debug, Deserialize)]
pub struct SaveHistoryRequest {
    pub id: Option<String>,
    pub query: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responses: Vec<AiResponse>,
}

/// POST /api/history
///
/// Saves a new history item and returns it with id and timestamp
/// filled in.
///
/// Errors:
/// - 400: empty query, too many responses, or the id already exists
///   (use PUT to replace)
pub async fn create_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
    ApiJson(payload): ApiJson<SaveHistoryRequest>,
) -> ApiResult<Json<HistoryItem>> {
    let backend = resolve_backend(&state, params.backend).await?;
    validate_item(&payload.query, &payload.responses)?;

    let id = match payload.id {
        Some(id) if id.trim().is_empty() => {
            return Err(ApiError::BadRequest("id must not be empty".to_string()));
        }
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    if state.stores.exists(backend, &id).await? {
        return Err(ApiError::BadRequest(format!(
            "history item {} already exists",
            id
        )));
    }

    let item = HistoryItem {
        id,
        query: payload.query,
        created_at: payload.created_at.unwrap_or_else(Utc::now),
        responses: payload.responses,
    };

    state.stores.upsert(backend, &item).await?;
    tracing::debug!(id = %item.id, backend = %backend, "History item saved");

    Ok(Json(item))
}

/// PUT /api/history
///
/// Replaces an existing history item wholesale.
///
/// Errors:
/// - 400: structural problems with the payload
/// - 404: no item with this id
pub async fn update_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
    ApiJson(item): ApiJson<HistoryItem>,
) -> ApiResult<Json<HistoryItem>> {
    let backend = resolve_backend(&state, params.backend).await?;

    if item.id.trim().is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".to_string()));
    }
    validate_item(&item.query, &item.responses)?;

    if !state.stores.exists(backend, &item.id).await? {
        return Err(ApiError::NotFound(format!("history item {}", item.id)));
    }

    state.stores.upsert(backend, &item).await?;
    tracing::debug!(id = %item.id, backend = %backend, "History item replaced");

    Ok(Json(item))
}

/// DELETE /api/history?id=...
///
/// Errors:
/// - 400: missing id parameter
/// - 404: no item with this id
pub async fn delete_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<AckResponse>> {
    let backend = resolve_backend(&state, params.backend).await?;
    let id = require_id(params.id)?;

    if !state.stores.delete(backend, &id).await? {
        return Err(ApiError::NotFound(format!("history item {}", id)));
    }

    Ok(Json(AckResponse::ok(format!("deleted history item {}", id))))
}

/// DELETE /api/history/all
///
/// Clears every item in the targeted backend.
pub async fn delete_all_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<AckResponse>> {
    let backend = resolve_backend(&state, params.backend).await?;
    state.stores.clear(backend).await?;
    tracing::info!(backend = %backend, "History cleared");

    Ok(Json(AckResponse::ok(format!("cleared {} history", backend))))
}
