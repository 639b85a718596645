//! Database load stage
//!
//! Replaces every content table from the CSVs the earlier stages wrote.
//! The county reference loads first; every other table carrying a
//! COUNTY_FIPS column is checked against it before any of its rows land.
//! Each table is replaced inside one transaction so the dashboard never
//! observes a half-loaded table.

use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use chrono::Utc;
use migra_common::db::{init_database, Table};
use migra_common::{Error, Result, Settings};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Columns always stored as TEXT so leading zeros survive
const TEXT_COLUMNS: [&str; 5] = ["COUNTY_FIPS", "STATE", "COUNTY", "NAME", "SCENARIO"];

pub async fn run(settings: &Settings, paths: &DataPaths) -> Result<()> {
    let pool = init_database(&settings.database_url).await?;
    load_all(&pool, paths).await?;
    pool.close().await;
    Ok(())
}

/// Load all tables in registry order; `Table::ALL` puts county first
pub async fn load_all(pool: &SqlitePool, paths: &DataPaths) -> Result<()> {
    let county = Frame::from_csv(&csv_path(paths, Table::County))?;
    let county_set = load_county(pool, &county).await?;

    for table in Table::ALL {
        if table == Table::County {
            continue;
        }
        let frame = Frame::from_csv(&csv_path(paths, table))?;
        check_referential(&frame, table, &county_set)?;
        replace_table(pool, table, &frame).await?;
        record_load(pool, table, frame.len()).await?;
    }

    info!("Load complete");
    Ok(())
}

/// CSV location for a table: analysis outputs live under projected data,
/// everything else under cleaned data.
fn csv_path(paths: &DataPaths, table: Table) -> PathBuf {
    match table {
        Table::PopulationProjections
        | Table::Combined2065
        | Table::ProjectedIndices
        | Table::SocioeconomicIndices
        | Table::SocioeconomicRankings => paths.projected_file(table.name()),
        _ => paths.cleaned_file(table.name()),
    }
}

/// Replace the county reference content and return its FIPS set
async fn load_county(pool: &SqlitePool, county: &Frame) -> Result<HashSet<String>> {
    for col in ["COUNTY_FIPS", "STATE", "COUNTY", "NAME"] {
        county.require_col(col)?;
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM county").execute(&mut *tx).await?;
    for r in 0..county.len() {
        sqlx::query("INSERT INTO county (COUNTY_FIPS, STATE, COUNTY, NAME) VALUES (?, ?, ?, ?)")
            .bind(county.text(r, "COUNTY_FIPS").unwrap_or_default())
            .bind(county.text(r, "STATE").unwrap_or_default())
            .bind(county.text(r, "COUNTY").unwrap_or_default())
            .bind(county.text(r, "NAME").unwrap_or_default())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    record_load(pool, Table::County, county.len()).await?;

    let fips_idx = county.require_col("COUNTY_FIPS")?;
    Ok((0..county.len())
        .map(|r| county.get(r, fips_idx).render())
        .collect())
}

/// Every COUNTY_FIPS value must reference a known county
fn check_referential(frame: &Frame, table: Table, county_set: &HashSet<String>) -> Result<()> {
    let Some(fips_idx) = frame.col("COUNTY_FIPS") else {
        return Ok(());
    };
    for r in 0..frame.len() {
        let fips = frame.get(r, fips_idx).render();
        if !county_set.contains(&fips) {
            return Err(Error::InvalidInput(format!(
                "{} row {} references unknown county '{}'",
                table.name(),
                r + 1,
                fips
            )));
        }
    }
    Ok(())
}

/// SQLite column type for a frame column
fn column_type(frame: &Frame, name: &str) -> &'static str {
    if TEXT_COLUMNS.contains(&name) {
        "TEXT"
    } else if frame.is_numeric(name) {
        "REAL"
    } else {
        "TEXT"
    }
}

/// Drop and recreate a table from a frame, inside one transaction.
/// Column names are quoted; decade columns like "1900" are plain digits.
async fn replace_table(pool: &SqlitePool, table: Table, frame: &Frame) -> Result<()> {
    let columns: Vec<String> = frame
        .columns()
        .iter()
        .map(|c| format!("\"{}\" {}", c, column_type(frame, c)))
        .collect();
    let create = format!("CREATE TABLE {} ({})", table.name(), columns.join(", "));

    let column_list: Vec<String> = frame
        .columns()
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect();
    let placeholders = vec!["?"; frame.columns().len()].join(", ");
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        column_list.join(", "),
        placeholders
    );

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table.name()))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create).execute(&mut *tx).await?;
    for row in frame.rows() {
        let mut query = sqlx::query(&insert);
        for cell in row {
            query = match cell {
                Cell::Null => query.bind(None::<String>),
                Cell::Num(v) => query.bind(*v),
                Cell::Text(s) => query.bind(s.as_str()),
            };
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("{}: {} rows loaded", table.name(), frame.len());
    Ok(())
}

async fn record_load(pool: &SqlitePool, table: Table, rows: usize) -> Result<()> {
    sqlx::query("INSERT INTO load_history (table_name, row_count, loaded_at) VALUES (?, ?, ?)")
        .bind(table.name())
        .bind(rows as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn county_fixture() -> Frame {
        let mut f = Frame::new(vec!["COUNTY_FIPS", "STATE", "COUNTY", "NAME"]);
        f.push_row(vec![
            Cell::text("01001"),
            Cell::text("01"),
            Cell::text("001"),
            Cell::text("Autauga County, Alabama"),
        ])
        .unwrap();
        f
    }

    async fn test_pool(dir: &tempfile::TempDir) -> SqlitePool {
        let url = format!("sqlite://{}/migra.db", dir.path().display());
        init_database(&url).await.unwrap()
    }

    #[tokio::test]
    async fn county_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool(&dir).await;
        let county = county_fixture();
        load_county(&pool, &county).await.unwrap();
        let set = load_county(&pool, &county).await.unwrap();
        assert_eq!(set.len(), 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM county")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn replace_table_recreates_content() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool(&dir).await;
        let mut frame = Frame::new(vec!["COUNTY_FIPS", "YEAR", "POPULATION"]);
        frame
            .push_row(vec![Cell::text("01001"), Cell::num(2023.0), Cell::num(59285.0)])
            .unwrap();

        replace_table(&pool, Table::CleanedPopulation, &frame).await.unwrap();
        replace_table(&pool, Table::CleanedPopulation, &frame).await.unwrap();

        let population: f64 = sqlx::query_scalar(
            "SELECT POPULATION FROM cleaned_population_data WHERE COUNTY_FIPS = '01001'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(population, 59285.0);
    }

    #[test]
    fn referential_check_names_the_offender() {
        let mut frame = Frame::new(vec!["COUNTY_FIPS", "YEAR"]);
        frame
            .push_row(vec![Cell::text("99999"), Cell::num(2023.0)])
            .unwrap();
        let county_set: HashSet<String> = ["01001".to_string()].into();
        let err = check_referential(&frame, Table::CleanedPopulation, &county_set).unwrap_err();
        assert!(err.to_string().contains("99999"));
    }

    #[test]
    fn key_columns_stay_text() {
        let mut frame = Frame::new(vec!["COUNTY_FIPS", "POPULATION"]);
        frame
            .push_row(vec![Cell::text("01001"), Cell::num(100.0)])
            .unwrap();
        assert_eq!(column_type(&frame, "COUNTY_FIPS"), "TEXT");
        assert_eq!(column_type(&frame, "POPULATION"), "REAL");
    }
}
