//! Database initialization
//!
//! The pipeline opens the database in read-write-create mode and recreates
//! content tables wholesale on each load; the dashboard opens read-only.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Open (or create) the database for the pipeline and apply base schema
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let url = with_mode(database_url, "rwc");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL keeps the dashboard readable while a load is in progress
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_county_table(&pool).await?;
    create_load_history_table(&pool).await?;

    info!("Database initialized: {}", database_url);
    Ok(pool)
}

/// Connect read-only for the dashboard. Fails fast with a clear message
/// when the database has not been created by a pipeline run yet.
pub async fn connect_readonly(database_url: &str) -> Result<SqlitePool> {
    let url = with_mode(database_url, "ro");
    let pool = SqlitePool::connect(&url).await?;
    Ok(pool)
}

/// Canonical county reference table. Loaded first on every run; all other
/// tables are checked against it.
pub async fn create_county_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS county (
            COUNTY_FIPS TEXT PRIMARY KEY,
            STATE TEXT NOT NULL,
            COUNTY TEXT NOT NULL,
            NAME TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Bookkeeping: one row per table per load, for inspection after a run
pub async fn create_load_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS load_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            table_name TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            loaded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Append a SQLite `mode=` query parameter to a connection string,
/// preserving any parameters already present.
fn with_mode(database_url: &str, mode: &str) -> String {
    if database_url.contains("mode=") {
        database_url.to_string()
    } else if database_url.contains('?') {
        format!("{}&mode={}", database_url, mode)
    } else {
        format!("{}?mode={}", database_url, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parameter_is_appended() {
        assert_eq!(
            with_mode("sqlite://data/migra.db", "rwc"),
            "sqlite://data/migra.db?mode=rwc"
        );
        assert_eq!(
            with_mode("sqlite://data/migra.db?cache=shared", "ro"),
            "sqlite://data/migra.db?cache=shared&mode=ro"
        );
        assert_eq!(
            with_mode("sqlite://data/migra.db?mode=rwc", "ro"),
            "sqlite://data/migra.db?mode=rwc"
        );
    }

    #[tokio::test]
    async fn init_creates_base_schema() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/migra.db", dir.path().display());
        let pool = init_database(&url).await.unwrap();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('county', 'load_history')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }
}
