//! # trifold-ui
//!
//! Web service for side-by-side AI provider comparison. One question
//! fans out to OpenAI, Anthropic, and Gemini at once; the answers are
//! rated per category and kept in either the SQLite database or a
//! JSON archive file.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod providers;
pub mod storage;

pub use error::{ApiError, ApiResult};

use providers::ProviderSet;
use storage::StoreSet;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings plus the database-backend history
    pub db: SqlitePool,
    /// Both history stores
    pub stores: StoreSet,
    /// The three provider clients
    pub providers: Arc<ProviderSet>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, stores: StoreSet, providers: ProviderSet) -> Self {
        Self {
            db,
            stores,
            providers: Arc::new(providers),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Ask endpoints
        .route("/api/ask", post(api::ask::ask))
        .route("/api/ask/all", post(api::ask::ask_all))
        .route("/api/providers", get(api::ask::list_providers))
        // History CRUD
        .route(
            "/api/history",
            get(api::history::get_history)
                .post(api::history::create_history)
                .put(api::history::update_history)
                .delete(api::history::delete_history),
        )
        .route(
            "/api/history/all",
            get(api::history::get_all_history).delete(api::history::delete_all_history),
        )
        .route("/api/history/rating", put(api::rating::update_rating))
        // Storage management
        .route(
            "/api/storage",
            get(api::storage::get_storage)
                .put(api::storage::set_storage)
                .delete(api::storage::wipe_storage),
        )
        .route("/api/storage/migrate", post(api::storage::migrate_storage))
        .route("/api/storage/validate", get(api::storage::validate_storage))
        // Build information
        .route("/api/buildinfo", get(api::buildinfo::get_build_info))
        // Embedded UI
        .route("/", get(api::ui::serve_index))
        .route("/static/app.js", get(api::ui::serve_app_js))
        .route("/static/style.css", get(api::ui::serve_style_css))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
