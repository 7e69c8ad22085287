use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::error;
use std::sync::Arc;

use crate::{db, AppState, DatedValue, TemperatureSummary};

/// First day of the final twelve months in the dataset
pub const LOOKBACK_START: &str = "2016-08-23";

/// Station with the most observations in the dataset
pub const MOST_ACTIVE_STATION: &str = "USC00519281";

fn query_failed(err: db::Error) -> (StatusCode, String) {
    error!("error querying climate data: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "One `{ \"<date>\": prcp }` object per measurement since 2016-08-23, prcp may be null"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query precipitation")
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DatedValue>>, (StatusCode, String)> {
    state
        .climate_db
        .precipitation(LOOKBACK_START)
        .await
        .map(Json)
        .map_err(query_failed)
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Distinct station identifiers", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query stations")
    ))]
pub async fn stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    state
        .climate_db
        .station_ids()
        .await
        .map(Json)
        .map_err(query_failed)
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "One `{ \"<date>\": tobs }` object per USC00519281 measurement since 2016-08-23"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query temperature observations")
    ))]
pub async fn tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DatedValue>>, (StatusCode, String)> {
    state
        .climate_db
        .temperature_observations(MOST_ACTIVE_STATION, LOOKBACK_START)
        .await
        .map(Json)
        .map_err(query_failed)
}

/// `start` is compared as a string against stored ISO dates and is not validated,
/// malformed input just narrows or empties the matching set.
#[utoipa::path(
    get,
    path = "/api/v1.0/{start}",
    params(
         ("start" = String, Path, description = "Inclusive lower bound, expected as YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature aggregates since start, null when nothing matched", body = TemperatureSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query temperatures")
    ))]
pub async fn start_date(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureSummary>, (StatusCode, String)> {
    state
        .climate_db
        .temperature_summary(&start)
        .await
        .map(Json)
        .map_err(query_failed)
}

/// Aggregates are grouped per station and only collapse to a triple when exactly
/// one station has readings in the range; any other count is a server error.
#[utoipa::path(
    get,
    path = "/api/v1.0/{start}/{end}",
    params(
         ("start" = String, Path, description = "Inclusive lower bound, expected as YYYY-MM-DD"),
         ("end" = String, Path, description = "Inclusive upper bound, expected as YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature aggregates for the single station reporting in range", body = TemperatureSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Query failed, or the range did not match exactly one station")
    ))]
pub async fn start_end_date(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureSummary>, (StatusCode, String)> {
    let groups = state
        .climate_db
        .station_temperature_summaries(&start, &end)
        .await
        .map_err(query_failed)?;

    TemperatureSummary::from_single_group(groups)
        .map(Json)
        .map_err(query_failed)
}
