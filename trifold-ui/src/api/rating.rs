//! Rating endpoint
//!
//! One PUT sets one category on one response to thumbs-up,
//! thumbs-down, or back to unknown (null).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use trifold_common::model::RatingCategory;

use crate::api::history::HistoryQuery;
use crate::api::storage::resolve_backend;
use crate::api::AckResponse;
use crate::error::{ApiJson, ApiQuery};
use crate::{ApiError, ApiResult, AppState};

/// Request payload for PUT /api/history/rating
#[derive(Debug, Deserialize)]
pub struct RatingUpdateRequest {
    /// History item id
    pub id: String,
    /// Which of the item's responses to rate (0-based)
    pub response_index: usize,
    pub category: String,
    /// true, false, or null to reset to unknown
    pub value: Option<bool>,
}

/// PUT /api/history/rating
///
/// Errors:
/// - 400: unknown category or response index out of range
/// - 404: no history item with this id
pub async fn update_rating(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
    ApiJson(payload): ApiJson<RatingUpdateRequest>,
) -> ApiResult<Json<AckResponse>> {
    let backend = resolve_backend(&state, params.backend).await?;

    let category: RatingCategory = payload.category.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "unknown rating category '{}' (expected one of: accuracy, relevance, completeness, concise, unbiased)",
            payload.category
        ))
    })?;

    state
        .stores
        .set_rating(backend, &payload.id, payload.response_index, category, payload.value)
        .await?;

    tracing::debug!(
        id = %payload.id,
        response_index = payload.response_index,
        category = %category,
        "Rating updated"
    );

    Ok(Json(AckResponse::ok(format!(
        "set {} rating on response {} of {}",
        category, payload.response_index, payload.id
    ))))
}
