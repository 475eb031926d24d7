//! In-memory [`ForecastStore`] used by this crate's unit tests.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{DateTime, Duration, TimeZone as _, Utc};

use crate::{
  geo::{BoundingBox, Coordinate, GridPoint},
  measurement::{
    AirQualityPoint, AllergenPoint, MeasurementBatch, MeasurementKind,
    NewAirQuality, NewAllergen, StoredSite,
  },
  store::ForecastStore,
};

#[derive(Debug, thiserror::Error)]
#[error("memory store unavailable")]
pub struct Unavailable;

#[derive(Default)]
pub struct MemoryStore {
  air_quality: Mutex<Vec<(i64, NewAirQuality)>>,
  allergen:    Mutex<Vec<(i64, NewAllergen)>>,
  next_id:     Mutex<i64>,
  fail_reads:  AtomicBool,
}

pub fn hour(offset: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(offset)
}

pub fn aq_row(location: Coordinate, offset: i64, aqi: i64) -> NewAirQuality {
  NewAirQuality { location, forecast_time: hour(offset), aqi, pm25: None, o3: None }
}

pub fn allergen_row(location: Coordinate, offset: i64, pollen_index: i64) -> NewAllergen {
  NewAllergen {
    location,
    forecast_time: hour(offset),
    pollen_index,
    tree_pollen_count: None,
    grass_pollen_count: None,
  }
}

impl MemoryStore {
  fn id(&self) -> i64 {
    let mut next = self.next_id.lock().unwrap();
    *next += 1;
    *next
  }

  pub fn push_air_quality(&self, row: NewAirQuality) {
    let id = self.id();
    self.air_quality.lock().unwrap().push((id, row));
  }

  pub fn push_allergen(&self, row: NewAllergen) {
    let id = self.id();
    self.allergen.lock().unwrap().push((id, row));
  }

  pub fn fail_reads(&self) { self.fail_reads.store(true, Ordering::SeqCst); }

  fn check(&self) -> Result<(), Unavailable> {
    if self.fail_reads.load(Ordering::SeqCst) { Err(Unavailable) } else { Ok(()) }
  }
}

/// Keep the latest row per forecast time, ascending, capped at `limit`.
fn latest_per_hour<T: Clone>(
  rows: impl Iterator<Item = (i64, DateTime<Utc>, T)>,
  limit: usize,
) -> Vec<T> {
  let mut by_time: BTreeMap<DateTime<Utc>, (i64, T)> = BTreeMap::new();
  for (id, at, row) in rows {
    match by_time.get(&at) {
      Some((existing, _)) if *existing > id => {}
      _ => {
        by_time.insert(at, (id, row));
      }
    }
  }
  by_time.into_values().map(|(_, row)| row).take(limit).collect()
}

fn sites<'a>(
  locations: impl Iterator<Item = (i64, &'a Coordinate)>,
  bbox: BoundingBox,
) -> Vec<StoredSite> {
  let mut first: BTreeMap<GridPoint, i64> = BTreeMap::new();
  for (id, loc) in locations {
    let grid = GridPoint::from(*loc);
    if bbox.contains(grid) {
      let entry = first.entry(grid).or_insert(id);
      *entry = (*entry).min(id);
    }
  }
  first
    .into_iter()
    .map(|(grid, id)| StoredSite { id, location: grid.into() })
    .collect()
}

impl ForecastStore for MemoryStore {
  type Error = Unavailable;

  async fn ping(&self) -> Result<(), Unavailable> { self.check() }

  async fn insert_batch(&self, batch: MeasurementBatch) -> Result<usize, Unavailable> {
    let n = batch.len();
    match batch {
      MeasurementBatch::AirQuality(rows) => rows.into_iter().for_each(|r| self.push_air_quality(r)),
      MeasurementBatch::Allergen(rows) => rows.into_iter().for_each(|r| self.push_allergen(r)),
    }
    Ok(n)
  }

  async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Unavailable> {
    let mut aq = self.air_quality.lock().unwrap();
    let mut al = self.allergen.lock().unwrap();
    let before = aq.len() + al.len();
    aq.retain(|(_, r)| r.forecast_time >= cutoff);
    al.retain(|(_, r)| r.forecast_time >= cutoff);
    Ok(before - aq.len() - al.len())
  }

  async fn sites_within(
    &self,
    kind: MeasurementKind,
    bbox: BoundingBox,
  ) -> Result<Vec<StoredSite>, Unavailable> {
    self.check()?;
    Ok(match kind {
      MeasurementKind::AirQuality => {
        let rows = self.air_quality.lock().unwrap();
        sites(rows.iter().map(|(id, r)| (*id, &r.location)), bbox)
      }
      MeasurementKind::Allergen => {
        let rows = self.allergen.lock().unwrap();
        sites(rows.iter().map(|(id, r)| (*id, &r.location)), bbox)
      }
    })
  }

  async fn air_quality_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> Result<Vec<AirQualityPoint>, Unavailable> {
    self.check()?;
    let target = GridPoint::from(location);
    let rows = self.air_quality.lock().unwrap();
    Ok(latest_per_hour(
      rows
        .iter()
        .filter(|(_, r)| GridPoint::from(r.location) == target)
        .map(|(id, r)| {
          (*id, r.forecast_time, AirQualityPoint {
            forecast_time: r.forecast_time,
            aqi:           r.aqi,
            pm25:          r.pm25,
            o3:            r.o3,
          })
        }),
      limit,
    ))
  }

  async fn allergen_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> Result<Vec<AllergenPoint>, Unavailable> {
    self.check()?;
    let target = GridPoint::from(location);
    let rows = self.allergen.lock().unwrap();
    Ok(latest_per_hour(
      rows
        .iter()
        .filter(|(_, r)| GridPoint::from(r.location) == target)
        .map(|(id, r)| {
          (*id, r.forecast_time, AllergenPoint {
            forecast_time:      r.forecast_time,
            pollen_index:       r.pollen_index,
            tree_pollen_count:  r.tree_pollen_count,
            grass_pollen_count: r.grass_pollen_count,
          })
        }),
      limit,
    ))
  }

  async fn count(&self, kind: MeasurementKind) -> Result<usize, Unavailable> {
    Ok(match kind {
      MeasurementKind::AirQuality => self.air_quality.lock().unwrap().len(),
      MeasurementKind::Allergen => self.allergen.lock().unwrap().len(),
    })
  }
}
