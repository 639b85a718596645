//! Indicator values from the cleaned observation tables

use crate::error::{ApiError, ApiResult};
use crate::queries::{observation_table, require_column, row_to_json, validate_fips};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct IndicatorFilter {
    pub county: Option<String>,
    pub year: Option<i64>,
}

/// GET /api/indicators/{table}/{metric}?county=&year= - one metric across
/// the county-years of an observation table. Both path segments are
/// validated before they reach the query; filters are bound parameters.
pub async fn indicator_values(
    State(state): State<AppState>,
    Path((table, metric)): Path<(String, String)>,
    Query(filter): Query<IndicatorFilter>,
) -> ApiResult<Json<Value>> {
    let table = observation_table(&table)?;
    require_column(&state.db, table, &metric).await?;
    if let Some(county) = &filter.county {
        validate_fips(county)?;
    }
    if let Some(year) = filter.year {
        if !(1900..=2100).contains(&year) {
            return Err(ApiError::BadRequest(format!("year {} out of range", year)));
        }
    }

    let key = format!(
        "indicator:{}:{}:{}:{}",
        table.name(),
        metric,
        filter.county.as_deref().unwrap_or("*"),
        filter.year.map(|y| y.to_string()).unwrap_or_else(|| "*".into()),
    );
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let mut sql = format!(
        "SELECT COUNTY_FIPS, YEAR, NAME, \"{}\" FROM {} WHERE 1 = 1",
        metric,
        table.name()
    );
    if filter.county.is_some() {
        sql.push_str(" AND COUNTY_FIPS = ?");
    }
    if filter.year.is_some() {
        sql.push_str(" AND YEAR = ?");
    }
    sql.push_str(" ORDER BY COUNTY_FIPS, YEAR");

    let mut query = sqlx::query(&sql);
    if let Some(county) = &filter.county {
        query = query.bind(county);
    }
    if let Some(year) = filter.year {
        query = query.bind(year);
    }
    let rows = query.fetch_all(&state.db).await?;
    let decoded: Vec<Value> = rows.iter().map(row_to_json).collect::<ApiResult<_>>()?;

    let value = Value::Array(decoded);
    state.cache.put(key, value.clone()).await;
    Ok(Json(value))
}
