//! Ask endpoints
//!
//! Single-provider ask plus the three-way fan-out, and the provider
//! listing the UI builds its column headers from.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use trifold_common::model::{HistoryItem, Provider};

use crate::error::ApiJson;
use crate::{ApiError, ApiResult, AppState};

/// Request payload for POST /api/ask
///
/// `model` carries the provider identifier (openai, anthropic,
/// gemini); the concrete model name is server configuration.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub model: String,
    pub query: String,
}

/// Response payload for POST /api/ask
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub provider: Provider,
    pub model: String,
    pub text: String,
    pub latency_ms: i64,
}

fn require_query(query: &str) -> ApiResult<()> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    Ok(())
}

/// POST /api/ask
///
/// Sends one query to one provider and returns its answer.
///
/// Errors:
/// - 400: unknown provider identifier or empty query
/// - 500: provider request failed
pub async fn ask(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let provider: Provider = payload.model.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "unknown provider '{}' (expected one of: openai, anthropic, gemini)",
            payload.model
        ))
    })?;
    require_query(&payload.query)?;

    let started = Instant::now();
    let text = state.providers.ask(provider, &payload.query).await?;
    let latency_ms = started.elapsed().as_millis() as i64;

    Ok(Json(AskResponse {
        provider,
        model: state.providers.settings(provider).model.clone(),
        text,
        latency_ms,
    }))
}

/// Request payload for POST /api/ask/all
#[derive(Debug, Deserialize)]
pub struct AskAllRequest {
    pub query: String,
}

/// POST /api/ask/all
///
/// Fans the query out to all three providers concurrently and returns
/// an unsaved history item; saving is a separate POST /api/history.
/// Per-provider failures land in each entry's error field rather than
/// failing the whole request.
pub async fn ask_all(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AskAllRequest>,
) -> ApiResult<Json<HistoryItem>> {
    require_query(&payload.query)?;

    let mut item = HistoryItem::new(payload.query);
    item.responses = state.providers.ask_all(&item.query).await;

    Ok(Json(item))
}

/// One entry of GET /api/providers
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: Provider,
    /// Concrete model this provider is configured to answer with
    pub model: String,
    /// Whether an API key is present for this provider
    pub configured: bool,
}

/// GET /api/providers
///
/// The fixed provider lineup in display order.
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let providers = Provider::ALL
        .iter()
        .map(|&provider| {
            let settings = state.providers.settings(provider);
            ProviderInfo {
                id: provider,
                model: settings.model.clone(),
                configured: settings.api_key.is_some(),
            }
        })
        .collect();

    Json(providers)
}
