//! County reference and population history endpoints

use crate::error::{ApiError, ApiResult};
use crate::queries::{fetch_json, row_to_json, validate_fips};
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

/// GET /api/counties - the county reference table
pub async fn list_counties(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    const KEY: &str = "counties";
    if let Some(cached) = state.cache.get(KEY).await {
        return Ok(Json(cached));
    }

    let rows = fetch_json(&state.db, "SELECT * FROM county ORDER BY COUNTY_FIPS").await?;
    let value = Value::Array(rows);
    state.cache.put(KEY, value.clone()).await;
    Ok(Json(value))
}

/// GET /api/counties/{fips}/population - decennial and modern history
/// keyed by year, plus the 2065 scenario projections when present
pub async fn population_timeseries(
    State(state): State<AppState>,
    Path(fips): Path<String>,
) -> ApiResult<Json<Value>> {
    validate_fips(&fips)?;
    let key = format!("population:{}", fips);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let row = sqlx::query("SELECT * FROM timeseries_population WHERE COUNTY_FIPS = ?")
        .bind(&fips)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no population history for county {}", fips)))?;
    let mut history = row_to_json(&row)?;
    if let Some(object) = history.as_object_mut() {
        object.remove("COUNTY_FIPS");
    }

    let projections = sqlx::query("SELECT * FROM county_population_projections WHERE COUNTY_FIPS = ?")
        .bind(&fips)
        .fetch_optional(&state.db)
        .await?;
    let projections = match &projections {
        Some(row) => row_to_json(row)?,
        None => Value::Null,
    };

    let value = serde_json::json!({
        "county_fips": fips,
        "history": history,
        "projections": projections,
    });
    state.cache.put(key, value.clone()).await;
    Ok(Json(value))
}
