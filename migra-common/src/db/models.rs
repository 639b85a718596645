//! Database row models

use serde::{Deserialize, Serialize};

/// Canonical county reference row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct County {
    #[serde(rename = "COUNTY_FIPS")]
    #[sqlx(rename = "COUNTY_FIPS")]
    pub county_fips: String,
    #[serde(rename = "STATE")]
    #[sqlx(rename = "STATE")]
    pub state: String,
    #[serde(rename = "COUNTY")]
    #[sqlx(rename = "COUNTY")]
    pub county: String,
    #[serde(rename = "NAME")]
    #[sqlx(rename = "NAME")]
    pub name: String,
}

/// One load_history bookkeeping row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoadRecord {
    pub id: i64,
    pub table_name: String,
    pub row_count: i64,
    pub loaded_at: String,
}
