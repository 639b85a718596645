//! 2065 scenario endpoints

use crate::error::{ApiError, ApiResult};
use crate::queries::{row_to_json, validate_fips};
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

/// GET /api/scenarios/{fips} - projected 2065 populations and scenario
/// indices for one county
pub async fn county_scenarios(
    State(state): State<AppState>,
    Path(fips): Path<String>,
) -> ApiResult<Json<Value>> {
    validate_fips(&fips)?;
    let key = format!("scenarios:{}", fips);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let projection = sqlx::query("SELECT * FROM county_population_projections WHERE COUNTY_FIPS = ?")
        .bind(&fips)
        .fetch_optional(&state.db)
        .await?;

    let index_rows = sqlx::query(
        "SELECT * FROM projected_socioeconomic_indices WHERE COUNTY_FIPS = ? ORDER BY SCENARIO",
    )
    .bind(&fips)
    .fetch_all(&state.db)
    .await?;

    if projection.is_none() && index_rows.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no scenario projections for county {}",
            fips
        )));
    }

    let projection = match &projection {
        Some(row) => row_to_json(row)?,
        None => Value::Null,
    };
    let indices: Vec<Value> = index_rows
        .iter()
        .map(row_to_json)
        .collect::<ApiResult<_>>()?;

    let value = json!({
        "county_fips": fips,
        "population_projection": projection,
        "scenario_indices": indices,
    });
    state.cache.put(key, value.clone()).await;
    Ok(Json(value))
}
