//! Raw provider records → typed measurement batches.

use haze_core::{
  geo::Coordinate,
  measurement::{MeasurementBatch, MeasurementKind, NewAirQuality, NewAllergen},
};

use crate::{IngestError, RawRecord};

/// Pollen grains per severity-index step.
const POLLEN_PER_INDEX: f64 = 50.0;

/// Convert a provider response for `kind` into a batch ready for loading.
///
/// Any malformed record fails the whole batch.
pub fn transform(
  kind: MeasurementKind,
  raw: Vec<RawRecord>,
) -> Result<MeasurementBatch, IngestError> {
  match kind {
    MeasurementKind::AirQuality => raw
      .into_iter()
      .enumerate()
      .map(|(index, r)| air_quality(index, r))
      .collect::<Result<_, _>>()
      .map(MeasurementBatch::AirQuality),
    MeasurementKind::Allergen => raw
      .into_iter()
      .enumerate()
      .map(|(index, r)| allergen(index, r))
      .collect::<Result<_, _>>()
      .map(MeasurementBatch::Allergen),
  }
}

/// `round(count / 50)`, with halves going to the even neighbour.
pub fn pollen_index(raw_pollen_count: i64) -> i64 {
  (raw_pollen_count as f64 / POLLEN_PER_INDEX).round_ties_even() as i64
}

fn location(index: usize, r: &RawRecord) -> Result<Coordinate, IngestError> {
  Coordinate::new(r.latitude, r.longitude).map_err(|e| IngestError::Transform {
    index,
    reason: e.to_string(),
  })
}

fn air_quality(index: usize, r: RawRecord) -> Result<NewAirQuality, IngestError> {
  let location = location(index, &r)?;
  let aqi = match r.raw_aqi {
    Some(v) if v >= 0 => v,
    Some(v) => return Err(bad(index, format!("raw_aqi must be non-negative, got {v}"))),
    None => return Err(bad(index, "raw_aqi missing".into())),
  };

  Ok(NewAirQuality {
    location,
    forecast_time: r.forecast_time,
    aqi,
    pm25: r.raw_pm25,
    o3: r.raw_o3,
  })
}

fn allergen(index: usize, r: RawRecord) -> Result<NewAllergen, IngestError> {
  let location = location(index, &r)?;
  let count = match r.raw_pollen_count {
    Some(v) if v >= 0 => v,
    Some(v) => {
      return Err(bad(index, format!("raw_pollen_count must be non-negative, got {v}")));
    }
    None => return Err(bad(index, "raw_pollen_count missing".into())),
  };

  Ok(NewAllergen {
    location,
    forecast_time: r.forecast_time,
    pollen_index: pollen_index(count),
    tree_pollen_count: Some(count),
    grass_pollen_count: r.raw_grass_pollen_count,
  })
}

fn bad(index: usize, reason: String) -> IngestError { IngestError::Transform { index, reason } }

#[cfg(test)]
mod tests {
  use chrono::{TimeZone as _, Utc};

  use super::*;
  use crate::{Site, SyntheticProvider};

  fn raw(aqi: Option<i64>, pollen: Option<i64>) -> RawRecord {
    RawRecord {
      latitude: 37.7749,
      longitude: -122.4194,
      forecast_time: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
      raw_aqi: aqi,
      raw_pm25: Some(10.5),
      raw_pollen_count: pollen,
      ..RawRecord::default()
    }
  }

  #[test]
  fn pollen_index_rounds_half_to_even() {
    assert_eq!(pollen_index(200), 4);
    assert_eq!(pollen_index(225), 4);
    assert_eq!(pollen_index(249), 5);
    assert_eq!(pollen_index(275), 6);
    assert_eq!(pollen_index(0), 0);
  }

  #[test]
  fn air_quality_fields_are_carried_over() {
    let batch = transform(MeasurementKind::AirQuality, vec![raw(Some(65), None)]).unwrap();
    let MeasurementBatch::AirQuality(rows) = batch else {
      panic!("expected an air-quality batch");
    };
    assert_eq!(rows[0].aqi, 65);
    assert_eq!(rows[0].pm25, Some(10.5));
    assert_eq!(rows[0].o3, None);
  }

  #[test]
  fn allergen_fields_are_derived() {
    let batch = transform(MeasurementKind::Allergen, vec![raw(None, Some(200))]).unwrap();
    let MeasurementBatch::Allergen(rows) = batch else {
      panic!("expected an allergen batch");
    };
    assert_eq!(rows[0].pollen_index, 4);
    assert_eq!(rows[0].tree_pollen_count, Some(200));
    assert_eq!(rows[0].grass_pollen_count, None);
  }

  #[test]
  fn missing_primary_field_fails_the_batch() {
    let records = vec![raw(Some(60), None), raw(None, None)];
    let err = transform(MeasurementKind::AirQuality, records).unwrap_err();
    assert!(matches!(err, IngestError::Transform { index: 1, .. }), "{err}");
  }

  #[test]
  fn invalid_coordinate_fails_the_batch() {
    let mut r = raw(None, Some(200));
    r.latitude = 123.0;
    let err = transform(MeasurementKind::Allergen, vec![r]).unwrap_err();
    assert!(matches!(err, IngestError::Transform { index: 0, .. }));
  }

  #[test]
  fn synthetic_window_transforms_cleanly() {
    let site = Site::defaults().remove(1);
    let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
    for kind in [MeasurementKind::AirQuality, MeasurementKind::Allergen] {
      let batch = transform(kind, SyntheticProvider::generate(kind, &site, start)).unwrap();
      assert_eq!(batch.kind(), kind);
      assert_eq!(batch.len(), 72);
    }
  }
}
