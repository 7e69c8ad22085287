mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;
use serde::{ser::SerializeMap, Serialize, Serializer};
use utoipa::ToSchema;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query climate database: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Climate database is missing table: {0}")]
    MissingTable(String),
    #[error("Climate database table {table} is missing column: {column}")]
    MissingColumn { table: String, column: String },
    #[error("Expected temperatures for exactly one station, found {0}")]
    AggregationMismatch(usize),
}

/// Read-only query interface over the measurement and station tables.
///
/// Date arguments are compared as strings against the stored ISO dates, so they
/// are passed through exactly as the caller supplied them.
#[async_trait]
pub trait ClimateData: Send + Sync {
    /// Every measurement on or after `since`, projected to (date, prcp), in storage order
    async fn precipitation(&self, since: &str) -> Result<Vec<DatedValue>, Error>;
    /// Distinct station identifiers from the station table
    async fn station_ids(&self) -> Result<Vec<String>, Error>;
    /// Measurements for one station on or after `since`, projected to (date, tobs)
    async fn temperature_observations(
        &self,
        station_id: &str,
        since: &str,
    ) -> Result<Vec<DatedValue>, Error>;
    /// Min/avg/max of tobs over all measurements on or after `start`
    async fn temperature_summary(&self, start: &str) -> Result<TemperatureSummary, Error>;
    /// Min/avg/max of tobs per station over measurements within `[start, end]`
    async fn station_temperature_summaries(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<StationSummary>, Error>;
}

/// A single observation keyed by its date, serialized as `{ "<date>": value }`
#[derive(Debug, Clone, PartialEq)]
pub struct DatedValue {
    pub date: String,
    pub value: Option<f64>,
}

impl DatedValue {
    pub fn new(date: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

impl Serialize for DatedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date, &self.value)?;
        map.end()
    }
}

/// Aggregate triple of observed temperatures
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TemperatureSummary {
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

impl TemperatureSummary {
    /// Collapses a per-station result into a single triple.
    ///
    /// Only a result with exactly one station group has a meaningful triple, any
    /// other count is reported as [`Error::AggregationMismatch`].
    pub fn from_single_group(groups: Vec<StationSummary>) -> Result<Self, Error> {
        let count = groups.len();
        let mut groups = groups.into_iter();
        match (groups.next(), groups.next()) {
            (Some(only), None) => Ok(only.into()),
            _ => Err(Error::AggregationMismatch(count)),
        }
    }
}

/// Temperature aggregates for one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationSummary {
    pub station: String,
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub tmax: Option<f64>,
}

impl From<StationSummary> for TemperatureSummary {
    fn from(value: StationSummary) -> Self {
        Self {
            tmin: value.tmin,
            tavg: value.tavg,
            tmax: value.tmax,
        }
    }
}
