//! Request handlers

pub mod counties;
pub mod health;
pub mod indicators;
pub mod indices;
pub mod scenarios;
pub mod ui;

use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

/// POST /api/cache/clear - empty the query cache after a pipeline reload
pub async fn cache_clear(State(state): State<AppState>) -> Json<Value> {
    let dropped = state.cache.clear().await;
    info!("Query cache cleared ({} entries)", dropped);
    Json(json!({ "cleared": dropped }))
}
