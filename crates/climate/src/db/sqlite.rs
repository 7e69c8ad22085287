use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hawaii_climate_core::is_file;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{str::FromStr, time::Duration};

use super::{ClimateData, DatedValue, Error, StationSummary, TemperatureSummary};

/// Tables and columns the service reads, checked against the file at startup
const SCHEMA: &[(&str, &[&str])] = &[
    ("measurement", &["station", "date", "prcp", "tobs"]),
    (
        "station",
        &["station", "name", "latitude", "longitude", "elevation"],
    ),
];

/// Read-only pool over the pre-loaded climate dataset.
///
/// Every query checks out one pooled connection for its duration; the
/// connection goes back to the pool when it drops, whether the query succeeded or not.
pub struct ClimateDatabase {
    pool: SqlitePool,
}

impl ClimateDatabase {
    pub async fn new(db_path: &str, max_connections: u32) -> anyhow::Result<Self> {
        if !is_file(db_path) {
            return Err(anyhow!("climate database not found at: {}", db_path));
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .read_only(true)
            .create_if_missing(false)
            .pragma("busy_timeout", "5000");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open climate database: {}", db_path))?;

        let db = Self { pool };
        db.validate_schema()
            .await
            .context("Climate database schema check failed")?;
        info!("Climate database opened read-only at: {}", db_path);

        Ok(db)
    }

    /// Fails if any table or column the queries rely on is absent.
    pub async fn validate_schema(&self) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        for (table, columns) in SCHEMA {
            let found: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
                .bind(*table)
                .fetch_all(&mut *conn)
                .await?;

            if found.is_empty() {
                return Err(Error::MissingTable(table.to_string()));
            }

            for column in columns.iter() {
                if !found.iter().any(|name| name.as_str() == *column) {
                    return Err(Error::MissingColumn {
                        table: table.to_string(),
                        column: column.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Closes all pooled connections, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Climate database pool closed");
    }
}

fn dated_value(row: &SqliteRow, column: &str) -> Result<DatedValue, sqlx::Error> {
    Ok(DatedValue {
        date: row.try_get("date")?,
        value: row.try_get(column)?,
    })
}

#[async_trait]
impl ClimateData for ClimateDatabase {
    async fn precipitation(&self, since: &str) -> Result<Vec<DatedValue>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query("SELECT date, prcp FROM measurement WHERE date >= ?")
            .bind(since)
            .fetch_all(&mut *conn)
            .await?;
        debug!("precipitation since {}: {} rows", since, rows.len());

        let values = rows
            .iter()
            .map(|row| dated_value(row, "prcp"))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(values)
    }

    async fn station_ids(&self) -> Result<Vec<String>, Error> {
        let mut conn = self.pool.acquire().await?;
        let stations: Vec<String> = sqlx::query_scalar("SELECT DISTINCT station FROM station")
            .fetch_all(&mut *conn)
            .await?;
        Ok(stations)
    }

    async fn temperature_observations(
        &self,
        station_id: &str,
        since: &str,
    ) -> Result<Vec<DatedValue>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT date, tobs FROM measurement
             WHERE date >= ? AND station = ?",
        )
        .bind(since)
        .bind(station_id)
        .fetch_all(&mut *conn)
        .await?;
        debug!(
            "temperature observations for {} since {}: {} rows",
            station_id,
            since,
            rows.len()
        );

        let values = rows
            .iter()
            .map(|row| dated_value(row, "tobs"))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(values)
    }

    async fn temperature_summary(&self, start: &str) -> Result<TemperatureSummary, Error> {
        let mut conn = self.pool.acquire().await?;
        // an aggregate without GROUP BY always yields one row, NULLs when nothing matched
        let row = sqlx::query(
            "SELECT CAST(MIN(tobs) AS REAL) AS tmin,
                    CAST(AVG(tobs) AS REAL) AS tavg,
                    CAST(MAX(tobs) AS REAL) AS tmax
             FROM measurement
             WHERE date >= ?",
        )
        .bind(start)
        .fetch_one(&mut *conn)
        .await?;

        Ok(TemperatureSummary {
            tmin: row.try_get("tmin")?,
            tavg: row.try_get("tavg")?,
            tmax: row.try_get("tmax")?,
        })
    }

    async fn station_temperature_summaries(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<StationSummary>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT station,
                    CAST(MIN(tobs) AS REAL) AS tmin,
                    CAST(AVG(tobs) AS REAL) AS tavg,
                    CAST(MAX(tobs) AS REAL) AS tmax
             FROM measurement
             WHERE date >= ? AND date <= ?
             GROUP BY station",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(StationSummary {
                station: row.try_get("station")?,
                tmin: row.try_get("tmin")?,
                tavg: row.try_get("tavg")?,
                tmax: row.try_get("tmax")?,
            });
        }

        Ok(summaries)
    }
}
