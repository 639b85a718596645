//! API tests against a small fixture database

use axum::body::Body;
use axum::http::{Request, StatusCode};
use migra_web::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

async fn fixture_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let url = format!("sqlite://{}/migra.db?mode=rwc", dir.path().display());
    let pool = SqlitePool::connect(&url).await.unwrap();

    sqlx::query(
        "CREATE TABLE county (COUNTY_FIPS TEXT PRIMARY KEY, STATE TEXT NOT NULL, \
         COUNTY TEXT NOT NULL, NAME TEXT NOT NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    for (fips, state, county, name) in [
        ("01001", "01", "001", "Autauga County, Alabama"),
        ("01003", "01", "003", "Baldwin County, Alabama"),
    ] {
        sqlx::query("INSERT INTO county VALUES (?, ?, ?, ?)")
            .bind(fips)
            .bind(state)
            .bind(county)
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
    }

    sqlx::query(
        "CREATE TABLE timeseries_population (COUNTY_FIPS TEXT, \"1900\" REAL, \
         \"2010\" REAL, \"2023\" REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO timeseries_population VALUES ('01001', 17915, 54571, 59285)")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE cleaned_economic_data (COUNTY_FIPS TEXT, YEAR REAL, NAME TEXT, \
         UNEMPLOYMENT_RATE REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO cleaned_economic_data VALUES ('01001', 2023, 'Autauga County, Alabama', 3.26)",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        "CREATE TABLE socioeconomic_indices (COUNTY_FIPS TEXT, YEAR REAL, \
         socioeconomic_index_balanced REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO socioeconomic_indices VALUES ('01001', 2023, 0.71)")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE socioeconomic_indices_rankings (COUNTY_FIPS TEXT, YEAR REAL, NAME TEXT, \
         socioeconomic_index_balanced_rank REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    for (fips, rank) in [("01001", 1.0), ("01003", 2.0)] {
        sqlx::query("INSERT INTO socioeconomic_indices_rankings VALUES (?, 2023, 'x', ?)")
            .bind(fips)
            .bind(rank)
            .execute(&pool)
            .await
            .unwrap();
    }

    sqlx::query(
        "CREATE TABLE county_population_projections (COUNTY_FIPS TEXT, \
         POPULATION_ORIGINAL REAL, POPULATION_S3 REAL, PCT_CHANGE_S3 REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO county_population_projections VALUES ('01001', 59285, 61000, 2.89)")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE projected_socioeconomic_indices (COUNTY_FIPS TEXT, SCENARIO TEXT, \
         projected_index_balanced REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO projected_socioeconomic_indices VALUES ('01001', 'S3', -0.12)")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn counties_are_listed_in_fips_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/api/counties").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["COUNTY_FIPS"], "01001");
    assert_eq!(rows[1]["NAME"], "Baldwin County, Alabama");
}

#[tokio::test]
async fn population_history_keys_years() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/api/counties/01001/population").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"]["1900"], 17915.0);
    assert_eq!(body["history"]["2023"], 59285.0);
    assert_eq!(body["projections"]["POPULATION_S3"], 61000.0);
}

#[tokio::test]
async fn unknown_county_is_404_and_bad_fips_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, _) = get(&app, "/api/counties/99999/population").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/counties/abcde/population").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn indicator_table_and_column_are_validated() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/api/indicators/cleaned_economic_data/UNEMPLOYMENT_RATE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap()[0]["UNEMPLOYMENT_RATE"], 3.26);

    let (status, _) = get(&app, "/api/indicators/sqlite_master/name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/indicators/cleaned_economic_data/NO_SUCH_METRIC").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rankings_filter_by_year() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/api/rankings?year=2023").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get(&app, "/api/rankings?year=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = get(&app, "/api/rankings?year=99999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rankings_order_by_requested_index() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) =
        get(&app, "/api/rankings?index=socioeconomic_index_balanced").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows[0]["socioeconomic_index_balanced_rank"], 1.0);
    assert_eq!(rows[1]["socioeconomic_index_balanced_rank"], 2.0);

    let (status, _) = get(&app, "/api/rankings?index=sqlite_master").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenarios_return_projection_and_indices() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    let (status, body) = get(&app, "/api/scenarios/01001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["population_projection"]["POPULATION_S3"], 61000.0);
    assert_eq!(body["scenario_indices"][0]["SCENARIO"], "S3");

    let (status, _) = get(&app, "/api/scenarios/01003").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cache_clear_reports_dropped_entries() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(fixture_pool(&dir).await));

    // warm the cache
    let (status, _) = get(&app, "/api/counties").await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["cleared"], 1);
}
