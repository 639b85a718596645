//! migra-web library - dashboard over the pipeline's SQLite database
//!
//! Serves a single-page dashboard plus a JSON API. The database is opened
//! read-only; query results are cached in memory until the cache is
//! cleared or the process restarts, since content only changes when the
//! pipeline reloads the database.

pub mod api;
pub mod cache;
pub mod error;
pub mod queries;

use axum::routing::{get, post};
use axum::Router;
use cache::QueryCache;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(db: SqlitePool) -> AppState {
        AppState {
            db,
            cache: QueryCache::new(),
        }
    }
}

/// Build the dashboard router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::ui::dashboard))
        .route("/health", get(api::health::health))
        .route("/api/counties", get(api::counties::list_counties))
        .route(
            "/api/counties/:fips/population",
            get(api::counties::population_timeseries),
        )
        .route(
            "/api/indicators/:table/:metric",
            get(api::indicators::indicator_values),
        )
        .route("/api/indices", get(api::indices::indices))
        .route("/api/rankings", get(api::indices::rankings))
        .route("/api/scenarios/:fips", get(api::scenarios::county_scenarios))
        .route("/api/cache/clear", post(api::cache_clear))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
