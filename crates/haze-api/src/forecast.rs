//! Handlers for `/api/forecast` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/forecast/{lat}/{lon}` | 404 if no site within the search radius |
//! | `GET`  | `/api/forecast?lat=..&lon=..` | Same, coordinates as query params |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use haze_core::{
  forecast::{HyperLocalForecast, hyper_local_forecast},
  geo::Coordinate,
  store::ForecastStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CoordinateParams {
  pub lat: f64,
  pub lon: f64,
}

/// `GET /api/forecast/{lat}/{lon}`
pub async fn by_path<S>(
  State(state): State<AppState<S>>,
  Path((lat, lon)): Path<(f64, f64)>,
) -> Result<Json<HyperLocalForecast>, ApiError>
where
  S: ForecastStore + 'static,
{
  lookup(&state, lat, lon).await.map(Json)
}

/// `GET /api/forecast?lat=<lat>&lon=<lon>`
pub async fn by_query<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<CoordinateParams>,
) -> Result<Json<HyperLocalForecast>, ApiError>
where
  S: ForecastStore + 'static,
{
  lookup(&state, params.lat, params.lon).await.map(Json)
}

async fn lookup<S>(
  state: &AppState<S>,
  lat: f64,
  lon: f64,
) -> Result<HyperLocalForecast, ApiError>
where
  S: ForecastStore + 'static,
{
  let query = Coordinate::new(lat, lon)?;
  let timeout = state.settings.query_timeout;

  let forecast = tokio::time::timeout(
    timeout,
    hyper_local_forecast(state.store.as_ref(), query, &state.settings.forecast),
  )
  .await
  .map_err(|_| {
    ApiError::StoreUnavailable(format!("forecast query exceeded {timeout:?}"))
  })??;

  tracing::debug!(
    lat,
    lon,
    distance_m = forecast.distance_meters,
    air_quality = forecast.air_quality_series.len(),
    allergen = forecast.allergen_series.len(),
    "forecast served"
  );
  Ok(forecast)
}
