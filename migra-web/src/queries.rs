//! Dynamic row decoding and query-input validation
//!
//! Pipeline tables have data-dependent column sets (decade columns,
//! per-metric z-scores), so rows are decoded into JSON objects by column
//! type instead of static models. Table and column names arrive from the
//! URL and are validated against the table registry and the live schema
//! before they are interpolated into SQL.

use crate::error::{ApiError, ApiResult};
use migra_common::db::Table;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

/// Decode one row into a JSON object keyed by column name
pub fn row_to_json(row: &SqliteRow) -> ApiResult<Value> {
    let mut object = serde_json::Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(i)?),
                "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(i)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                _ => Value::String(row.try_get::<String, _>(i)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }
    Ok(Value::Object(object))
}

/// Run a query and decode every row
pub async fn fetch_json(pool: &SqlitePool, sql: &str) -> ApiResult<Vec<Value>> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    rows.iter().map(row_to_json).collect()
}

/// Resolve a table name from the URL against the registry
pub fn known_table(name: &str) -> ApiResult<Table> {
    Table::from_name(name)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown table '{}'", name)))
}

/// Tables exposed by the indicator endpoint
pub fn observation_table(name: &str) -> ApiResult<Table> {
    let table = known_table(name)?;
    if !table.is_cleaned_observation() {
        return Err(ApiError::BadRequest(format!(
            "'{}' is not an observation table",
            name
        )));
    }
    Ok(table)
}

/// Check a column exists on a table before interpolating its name
pub async fn require_column(pool: &SqlitePool, table: Table, column: &str) -> ApiResult<()> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table.name()))
        .fetch_all(pool)
        .await?;
    for row in &rows {
        let name: String = row.try_get("name")?;
        if name == column {
            return Ok(());
        }
    }
    Err(ApiError::BadRequest(format!(
        "table '{}' has no column '{}'",
        table.name(),
        column
    )))
}

/// County FIPS codes arrive from the URL; only 5-digit codes pass
pub fn validate_fips(fips: &str) -> ApiResult<()> {
    if fips.len() == 5 && fips.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid county FIPS '{}'",
            fips
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tables_are_rejected() {
        assert!(known_table("county").is_ok());
        assert!(known_table("sqlite_master").is_err());
        assert!(known_table("county; DROP TABLE county").is_err());
    }

    #[test]
    fn only_observation_tables_serve_indicators() {
        assert!(observation_table("cleaned_economic_data").is_ok());
        assert!(observation_table("county").is_err());
        assert!(observation_table("socioeconomic_indices").is_err());
    }

    #[test]
    fn fips_validation_requires_five_digits() {
        assert!(validate_fips("01001").is_ok());
        assert!(validate_fips("1001").is_err());
        assert!(validate_fips("0100a").is_err());
        assert!(validate_fips("01001' OR '1'='1").is_err());
    }
}
