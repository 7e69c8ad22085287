use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use climate::{
    app, AppState, ClimateData, ClimateDatabase, DatedValue, Error, StationSummary,
    TemperatureSummary,
};
use hyper::{header, Method};
use mockall::mock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::{str::FromStr, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;

mock! {
    pub ClimateAccess {}
    #[async_trait]
    impl ClimateData for ClimateAccess {
        async fn precipitation(&self, since: &str) -> Result<Vec<DatedValue>, Error>;
        async fn station_ids(&self) -> Result<Vec<String>, Error>;
        async fn temperature_observations(
            &self,
            station_id: &str,
            since: &str,
        ) -> Result<Vec<DatedValue>, Error>;
        async fn temperature_summary(&self, start: &str) -> Result<TemperatureSummary, Error>;
        async fn station_temperature_summaries(
            &self,
            start: &str,
            end: &str,
        ) -> Result<Vec<StationSummary>, Error>;
    }
}

pub struct TestApp {
    pub app: Router,
}

pub async fn spawn_app(climate_db: Arc<dyn ClimateData>) -> TestApp {
    TestApp {
        app: app(AppState::new(climate_db)),
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.get(uri).await;
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}

/// One measurement row: (station, date, prcp, tobs)
pub type Reading<'a> = (&'a str, &'a str, Option<f64>, f64);

/// Writes a dataset with the same layout as the bundled hawaii.sqlite, then runs `extra_sql`
/// for rows the typed inserts cannot express. Returns the directory (which must outlive any
/// database opened on it) and the file path.
pub async fn write_dataset(
    stations: &[&str],
    readings: &[Reading<'_>],
    extra_sql: &str,
) -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hawaii.sqlite").display().to_string();

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    sqlx::raw_sql(
        "CREATE TABLE station (id INTEGER PRIMARY KEY, station TEXT, name TEXT,
                               latitude FLOAT, longitude FLOAT, elevation FLOAT);
         CREATE TABLE measurement (id INTEGER PRIMARY KEY, station TEXT, date TEXT,
                                   prcp FLOAT, tobs FLOAT);",
    )
    .execute(&pool)
    .await
    .unwrap();

    for station in stations {
        sqlx::query(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?, 'TEST STATION, HI US', 21.3, -157.8, 10.0)",
        )
        .bind(*station)
        .execute(&pool)
        .await
        .unwrap();
    }

    for (station, date, prcp, tobs) in readings {
        sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?, ?, ?, ?)")
            .bind(*station)
            .bind(*date)
            .bind(*prcp)
            .bind(*tobs)
            .execute(&pool)
            .await
            .unwrap();
    }

    if !extra_sql.is_empty() {
        sqlx::raw_sql(extra_sql).execute(&pool).await.unwrap();
    }
    pool.close().await;

    (dir, path)
}

/// Seeds a dataset and opens it read-only.
pub async fn seed_database(
    stations: &[&str],
    readings: &[Reading<'_>],
) -> (TempDir, ClimateDatabase) {
    let (dir, path) = write_dataset(stations, readings, "").await;
    let db = ClimateDatabase::new(&path, 2).await.unwrap();
    (dir, db)
}

pub async fn spawn_app_with_data(
    stations: &[&str],
    readings: &[Reading<'_>],
) -> (TempDir, TestApp) {
    let (dir, db) = seed_database(stations, readings).await;
    (dir, spawn_app(Arc::new(db)).await)
}
