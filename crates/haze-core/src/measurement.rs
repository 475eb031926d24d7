//! Measurement types: the rows the store holds and the points it serves.
//!
//! Measurements are immutable once written. Ingestion produces `New*`
//! records; the store assigns `id` and `ingestion_timestamp` at write time and
//! hands back `*Point` values on the read path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::geo::Coordinate;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The two measurement families served by the forecast endpoint.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementKind {
  AirQuality,
  Allergen,
}

// ─── Insert-side records ─────────────────────────────────────────────────────

/// An air-quality forecast for one site and hour, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAirQuality {
  pub location:      Coordinate,
  pub forecast_time: DateTime<Utc>,
  /// Air Quality Index.
  pub aqi:           i64,
  /// PM2.5 concentration (µg/m³).
  pub pm25:          Option<f64>,
  /// Ozone concentration (ppb).
  pub o3:            Option<f64>,
}

/// An allergen forecast for one site and hour, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAllergen {
  pub location:           Coordinate,
  pub forecast_time:      DateTime<Utc>,
  /// General pollen severity index (0-12).
  pub pollen_index:       i64,
  pub tree_pollen_count:  Option<i64>,
  pub grass_pollen_count: Option<i64>,
}

/// A homogeneous group of records written in one transaction.
///
/// One batch corresponds to one (site, feed) pair of an ingestion tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementBatch {
  AirQuality(Vec<NewAirQuality>),
  Allergen(Vec<NewAllergen>),
}

impl MeasurementBatch {
  pub fn kind(&self) -> MeasurementKind {
    match self {
      Self::AirQuality(_) => MeasurementKind::AirQuality,
      Self::Allergen(_) => MeasurementKind::Allergen,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::AirQuality(rows) => rows.len(),
      Self::Allergen(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Read-side points ────────────────────────────────────────────────────────

/// A single AQI forecast point at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityPoint {
  pub forecast_time: DateTime<Utc>,
  pub aqi:           i64,
  pub pm25:          Option<f64>,
  pub o3:            Option<f64>,
}

/// A single allergen forecast point at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergenPoint {
  pub forecast_time:      DateTime<Utc>,
  pub pollen_index:       i64,
  pub tree_pollen_count:  Option<i64>,
  pub grass_pollen_count: Option<i64>,
}

/// One distinct stored location of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredSite {
  /// Lowest row id recorded at this location; used as a stable tie-breaker.
  pub id:       i64,
  pub location: Coordinate,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn kind_string_forms() {
    assert_eq!(MeasurementKind::AirQuality.to_string(), "air_quality");
    assert_eq!(
      MeasurementKind::from_str("allergen").unwrap(),
      MeasurementKind::Allergen
    );
    assert_eq!(MeasurementKind::iter().count(), 2);
  }

  #[test]
  fn batch_reports_kind_and_len() {
    let batch = MeasurementBatch::Allergen(vec![]);
    assert_eq!(batch.kind(), MeasurementKind::Allergen);
    assert!(batch.is_empty());
  }
}
