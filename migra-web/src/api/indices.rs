//! Socioeconomic index and ranking endpoints

use crate::error::{ApiError, ApiResult};
use crate::queries::fetch_json;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct YearFilter {
    pub year: Option<i64>,
}

#[derive(Deserialize)]
pub struct RankingFilter {
    pub year: Option<i64>,
    pub index: Option<String>,
}

const RANKED_INDICES: [&str; 4] = [
    "socioeconomic_index_balanced",
    "socioeconomic_index_economy_focused",
    "socioeconomic_index_safety_focused",
    "socioeconomic_index_opportunity_focused",
];

fn year_clause(year: Option<i64>) -> ApiResult<String> {
    match year {
        None => Ok(String::new()),
        Some(y) if (1900..=2100).contains(&y) => Ok(format!(" WHERE YEAR = {}", y)),
        Some(y) => Err(ApiError::BadRequest(format!("year {} out of range", y))),
    }
}

/// GET /api/indices[?year=] - composite indices per county-year
pub async fn indices(
    State(state): State<AppState>,
    Query(filter): Query<YearFilter>,
) -> ApiResult<Json<Value>> {
    let clause = year_clause(filter.year)?;
    let key = format!("indices:{:?}", filter.year);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let sql = format!(
        "SELECT * FROM socioeconomic_indices{} ORDER BY COUNTY_FIPS, YEAR",
        clause
    );
    let rows = fetch_json(&state.db, &sql).await?;
    let value = Value::Array(rows);
    state.cache.put(key, value.clone()).await;
    Ok(Json(value))
}

/// GET /api/rankings[?year=&index=] - ordinal rankings per county-year.
/// With `index`, rows come back ordered by that index's rank.
pub async fn rankings(
    State(state): State<AppState>,
    Query(filter): Query<RankingFilter>,
) -> ApiResult<Json<Value>> {
    let clause = year_clause(filter.year)?;
    let order = match &filter.index {
        None => "COUNTY_FIPS, YEAR".to_string(),
        Some(index) => {
            if !RANKED_INDICES.contains(&index.as_str()) {
                return Err(ApiError::BadRequest(format!("unknown index '{}'", index)));
            }
            format!("YEAR, {}_rank", index)
        }
    };
    let key = format!("rankings:{:?}:{:?}", filter.year, filter.index);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let sql = format!(
        "SELECT * FROM socioeconomic_indices_rankings{} ORDER BY {}",
        clause, order
    );
    let rows = fetch_json(&state.db, &sql).await?;
    let value = Value::Array(rows);
    state.cache.put(key, value.clone()).await;
    Ok(Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_filter_bounds_are_enforced() {
        assert_eq!(year_clause(None).unwrap(), "");
        assert_eq!(year_clause(Some(2023)).unwrap(), " WHERE YEAR = 2023");
        assert!(year_clause(Some(99_999)).is_err());
    }
}
