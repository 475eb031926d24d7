//! The hyper-local forecast read path: resolve, then assemble.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  geo::Coordinate,
  measurement::{AirQualityPoint, AllergenPoint},
  resolve::{DEFAULT_SEARCH_RADIUS_M, find_nearest_any},
  series::{FORECAST_HOURS, assemble},
  store::ForecastStore,
};

/// Tunables for [`hyper_local_forecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastOptions {
  pub radius_m: f64,
  pub hours:    usize,
}

impl Default for ForecastOptions {
  fn default() -> Self {
    Self { radius_m: DEFAULT_SEARCH_RADIUS_M, hours: FORECAST_HOURS }
  }
}

/// The complete 72-hour forecast for the site nearest a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperLocalForecast {
  /// Latitude of the nearest forecast point.
  pub latitude:           f64,
  /// Longitude of the nearest forecast point.
  pub longitude:          f64,
  /// Distance from the requested location to the forecast point, rounded to
  /// centimeters.
  pub distance_meters:    f64,
  pub air_quality_series: Vec<AirQualityPoint>,
  pub allergen_series:    Vec<AllergenPoint>,
}

/// Resolve `query` to the nearest stored site and return its forecast.
pub async fn hyper_local_forecast<S>(
  store: &S,
  query: Coordinate,
  options: &ForecastOptions,
) -> Result<HyperLocalForecast>
where
  S: ForecastStore,
{
  let nearest = find_nearest_any(store, query, options.radius_m).await?;
  let location = nearest.site.location;
  let series = assemble(store, location, options.hours).await?;

  Ok(HyperLocalForecast {
    latitude:           location.latitude,
    longitude:          location.longitude,
    distance_meters:    round_centimeters(nearest.distance_m),
    air_quality_series: series.air_quality,
    allergen_series:    series.allergen,
  })
}

fn round_centimeters(meters: f64) -> f64 { (meters * 100.0).round() / 100.0 }
