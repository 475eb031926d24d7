//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Coordinates are stored as grid microdegrees.

use chrono::{DateTime, SecondsFormat, Utc};
use haze_core::{
  geo::GridPoint,
  measurement::{
    AirQualityPoint, AllergenPoint, MeasurementKind, NewAirQuality, NewAllergen,
  },
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── MeasurementKind ─────────────────────────────────────────────────────────

pub fn table_for(kind: MeasurementKind) -> &'static str {
  match kind {
    MeasurementKind::AirQuality => "air_quality_records",
    MeasurementKind::Allergen => "allergen_records",
  }
}

// ─── Insert rows ─────────────────────────────────────────────────────────────

/// An air-quality record flattened into bindable column values.
pub struct AirQualityRow {
  pub lat_e6:        i64,
  pub lon_e6:        i64,
  pub forecast_time: String,
  pub aqi:           i64,
  pub pm25:          Option<f64>,
  pub o3:            Option<f64>,
}

impl From<NewAirQuality> for AirQualityRow {
  fn from(r: NewAirQuality) -> Self {
    let grid = GridPoint::from(r.location);
    Self {
      lat_e6:        grid.lat_e6,
      lon_e6:        grid.lon_e6,
      forecast_time: encode_dt(r.forecast_time),
      aqi:           r.aqi,
      pm25:          r.pm25,
      o3:            r.o3,
    }
  }
}

/// An allergen record flattened into bindable column values.
pub struct AllergenRow {
  pub lat_e6:             i64,
  pub lon_e6:             i64,
  pub forecast_time:      String,
  pub pollen_index:       i64,
  pub tree_pollen_count:  Option<i64>,
  pub grass_pollen_count: Option<i64>,
}

impl From<NewAllergen> for AllergenRow {
  fn from(r: NewAllergen) -> Self {
    let grid = GridPoint::from(r.location);
    Self {
      lat_e6:             grid.lat_e6,
      lon_e6:             grid.lon_e6,
      forecast_time:      encode_dt(r.forecast_time),
      pollen_index:       r.pollen_index,
      tree_pollen_count:  r.tree_pollen_count,
      grass_pollen_count: r.grass_pollen_count,
    }
  }
}

// ─── Read rows ───────────────────────────────────────────────────────────────

/// Intermediate struct for an air-quality row read back from SQLite.
pub struct RawAirQualityPoint {
  pub forecast_time: String,
  pub aqi:           i64,
  pub pm25:          Option<f64>,
  pub o3:            Option<f64>,
}

impl RawAirQualityPoint {
  pub fn into_point(self) -> Result<AirQualityPoint> {
    Ok(AirQualityPoint {
      forecast_time: decode_dt(&self.forecast_time)?,
      aqi:           self.aqi,
      pm25:          self.pm25,
      o3:            self.o3,
    })
  }
}

/// Intermediate struct for an allergen row read back from SQLite.
pub struct RawAllergenPoint {
  pub forecast_time:      String,
  pub pollen_index:       i64,
  pub tree_pollen_count:  Option<i64>,
  pub grass_pollen_count: Option<i64>,
}

impl RawAllergenPoint {
  pub fn into_point(self) -> Result<AllergenPoint> {
    Ok(AllergenPoint {
      forecast_time:      decode_dt(&self.forecast_time)?,
      pollen_index:       self.pollen_index,
      tree_pollen_count:  self.tree_pollen_count,
      grass_pollen_count: self.grass_pollen_count,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let b = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a), "2026-01-01T09:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
