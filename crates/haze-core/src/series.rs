//! Time-series assembly for a resolved site.

use serde::Serialize;

use crate::{
  Error, Result,
  geo::Coordinate,
  measurement::{AirQualityPoint, AllergenPoint},
  store::ForecastStore,
};

/// Length of the forecast window served for one site, in hours.
pub const FORECAST_HOURS: usize = 72;

/// Both measurement series for one site, each in ascending `forecast_time`
/// order. Missing hours are simply absent; nothing is interpolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
  pub air_quality: Vec<AirQualityPoint>,
  pub allergen:    Vec<AllergenPoint>,
}

/// Collect up to `hours_limit` points of each kind recorded at exactly
/// `location`.
///
/// Either series may come back empty; that is not an error.
pub async fn assemble<S>(
  store: &S,
  location: Coordinate,
  hours_limit: usize,
) -> Result<ForecastSeries>
where
  S: ForecastStore,
{
  let air_quality = store
    .air_quality_series(location, hours_limit)
    .await
    .map_err(Error::store)?;
  let allergen = store
    .allergen_series(location, hours_limit)
    .await
    .map_err(Error::store)?;

  Ok(ForecastSeries { air_quality, allergen })
}
