//! Health endpoint

use crate::error::ApiResult;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// GET /health - liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await?;
    Ok(Json(json!({
        "status": "ok",
        "module": "migra-web",
        "version": env!("CARGO_PKG_VERSION"),
        "database": "ok",
    })))
}
