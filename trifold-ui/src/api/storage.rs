//! Storage management endpoints
//!
//! Active-backend selection plus the migrate, validate, and wipe
//! utilities.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use trifold_common::model::StorageBackend;

use crate::api::AckResponse;
use crate::db::settings;
use crate::error::{ApiJson, ApiQuery};
use crate::storage::{migrate, validate_items, MigrationReport, ValidationReport};
use crate::{ApiError, ApiResult, AppState};

/// Resolve the backend for one request: an explicit override wins,
/// otherwise the persisted selection applies.
pub(crate) async fn resolve_backend(
    state: &AppState,
    requested: Option<StorageBackend>,
) -> ApiResult<StorageBackend> {
    match requested {
        Some(backend) => Ok(backend),
        None => Ok(settings::get_storage_backend(&state.db).await?),
    }
}

/// Query parameters naming a backend.
#[derive(Debug, Default, Deserialize)]
pub struct BackendQuery {
    pub backend: Option<StorageBackend>,
}

/// Response payload for GET /api/storage
#[derive(Debug, Serialize)]
pub struct StorageStatusResponse {
    /// Backend new history lands in
    pub active: StorageBackend,
    pub database_items: usize,
    pub archive_items: usize,
    pub archive_path: String,
}

/// GET /api/storage
///
/// The active backend plus item counts for both stores.
pub async fn get_storage(State(state): State<AppState>) -> ApiResult<Json<StorageStatusResponse>> {
    let active = settings::get_storage_backend(&state.db).await?;
    let database_items = state.stores.count(StorageBackend::Database).await?;
    let archive_items = state.stores.count(StorageBackend::Archive).await?;

    Ok(Json(StorageStatusResponse {
        active,
        database_items,
        archive_items,
        archive_path: state.stores.archive().path().display().to_string(),
    }))
}

/// Request payload for PUT /api/storage
#[derive(Debug, Deserialize)]
pub struct SetStorageRequest {
    pub backend: StorageBackend,
}

/// PUT /api/storage
///
/// Persists the active backend selection.
pub async fn set_storage(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SetStorageRequest>,
) -> ApiResult<Json<AckResponse>> {
    settings::set_storage_backend(&state.db, payload.backend).await?;
    tracing::info!(backend = %payload.backend, "Active storage backend changed");

    Ok(Json(AckResponse::ok(format!(
        "active backend set to {}",
        payload.backend
    ))))
}

/// Request payload for POST /api/storage/migrate
#[derive(Debug, Deserialize)]
pub struct MigrateRequest {
    pub from: StorageBackend,
    pub to: StorageBackend,
}

/// POST /api/storage/migrate
///
/// Copies all items from one backend into the other. The source is
/// left intact.
///
/// Errors:
/// - 400: source and destination are the same
pub async fn migrate_storage(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MigrateRequest>,
) -> ApiResult<Json<MigrationReport>> {
    let report = migrate(&state.stores, payload.from, payload.to).await?;
    Ok(Json(report))
}

/// GET /api/storage/validate?backend=...
///
/// Runs structural checks over one backend's items; defaults to the
/// active backend when none is named.
pub async fn validate_storage(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BackendQuery>,
) -> ApiResult<Json<ValidationReport>> {
    let backend = resolve_backend(&state, params.backend).await?;
    let items = state.stores.list(backend).await?;

    Ok(Json(validate_items(backend, &items)))
}

/// DELETE /api/storage?backend=...
///
/// Wipes one backend's history. The backend must be named explicitly;
/// there is no default here.
///
/// Errors:
/// - 400: missing backend parameter
pub async fn wipe_storage(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BackendQuery>,
) -> ApiResult<Json<AckResponse>> {
    let backend = params
        .backend
        .ok_or_else(|| ApiError::BadRequest("missing backend parameter".to_string()))?;

    state.stores.clear(backend).await?;
    tracing::info!(backend = %backend, "Storage wiped");

    Ok(Json(AckResponse::ok(format!("wiped {} storage", backend))))
}
