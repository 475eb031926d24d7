//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use haze_core::{
  Error as CoreError,
  forecast::{ForecastOptions, hyper_local_forecast},
  geo::{BoundingBox, Coordinate},
  measurement::{MeasurementBatch, MeasurementKind, NewAirQuality, NewAllergen},
  series::FORECAST_HOURS,
  store::ForecastStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn c(lat: f64, lon: f64) -> Coordinate { Coordinate::new(lat, lon).unwrap() }

fn hour(offset: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::hours(offset)
}

fn aq_batch(site: Coordinate, hours: std::ops::Range<i64>, base_aqi: i64) -> MeasurementBatch {
  MeasurementBatch::AirQuality(
    hours
      .map(|h| NewAirQuality {
        location:      site,
        forecast_time: hour(h),
        aqi:           base_aqi + h,
        pm25:          Some(10.5 + h as f64 * 0.25),
        o3:            None,
      })
      .collect(),
  )
}

fn allergen_batch(site: Coordinate, hours: std::ops::Range<i64>) -> MeasurementBatch {
  MeasurementBatch::Allergen(
    hours
      .map(|h| NewAllergen {
        location:           site,
        forecast_time:      hour(h),
        pollen_index:       4,
        tree_pollen_count:  Some(200 + h),
        grass_pollen_count: None,
      })
      .collect(),
  )
}

const SF: (f64, f64) = (37.7749, -122.4194);
const LA: (f64, f64) = (34.0522, -118.2437);

// ─── Connection ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_succeeds_on_fresh_store() {
  store().await.ping().await.unwrap();
}

#[tokio::test]
async fn connect_accepts_memory_url() {
  let s = SqliteStore::connect("sqlite::memory:").await.unwrap();
  assert_eq!(s.count(MeasurementKind::AirQuality).await.unwrap(), 0);
}

#[tokio::test]
async fn connect_rejects_foreign_schemes() {
  let result = SqliteStore::connect("postgres://localhost/haze").await;
  assert!(matches!(result, Err(Error::UnsupportedUrl(_))));
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_batch_writes_every_record() {
  let s = store().await;
  let site = c(SF.0, SF.1);

  let written = s.insert_batch(aq_batch(site, 0..72, 50)).await.unwrap();
  assert_eq!(written, 72);
  assert_eq!(s.count(MeasurementKind::AirQuality).await.unwrap(), 72);
  assert_eq!(s.count(MeasurementKind::Allergen).await.unwrap(), 0);
}

#[tokio::test]
async fn failing_batch_is_rolled_back_entirely() {
  let s = store().await;
  let site = c(SF.0, SF.1);

  let mut rows = match aq_batch(site, 0..10, 50) {
    MeasurementBatch::AirQuality(rows) => rows,
    MeasurementBatch::Allergen(_) => unreachable!(),
  };
  // Violates the aqi >= 0 check halfway through the batch.
  rows[5].aqi = -1;

  let result = s.insert_batch(MeasurementBatch::AirQuality(rows)).await;
  assert!(result.is_err());
  assert_eq!(s.count(MeasurementKind::AirQuality).await.unwrap(), 0);
}

#[tokio::test]
async fn purge_removes_only_past_forecasts() {
  let s = store().await;
  let site = c(LA.0, LA.1);
  s.insert_batch(aq_batch(site, 0..10, 50)).await.unwrap();
  s.insert_batch(allergen_batch(site, 0..10)).await.unwrap();

  let removed = s.purge_before(hour(4)).await.unwrap();
  assert_eq!(removed, 8);
  assert_eq!(s.count(MeasurementKind::AirQuality).await.unwrap(), 6);
  assert_eq!(s.count(MeasurementKind::Allergen).await.unwrap(), 6);
}

// ─── Spatial reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sites_within_returns_distinct_locations_in_the_box() {
  let s = store().await;
  s.insert_batch(aq_batch(c(SF.0, SF.1), 0..5, 50)).await.unwrap();
  s.insert_batch(aq_batch(c(LA.0, LA.1), 0..5, 50)).await.unwrap();

  let bbox = BoundingBox::around(c(37.7750, -122.4195), 5_000.0);
  let sites = s
    .sites_within(MeasurementKind::AirQuality, bbox)
    .await
    .unwrap();

  assert_eq!(sites.len(), 1);
  assert_eq!(sites[0].location, c(SF.0, SF.1));
  assert_eq!(sites[0].id, 1);

  let allergen_sites = s
    .sites_within(MeasurementKind::Allergen, bbox)
    .await
    .unwrap();
  assert!(allergen_sites.is_empty());
}

// ─── Series reads ────────────────────────────────────────────────────────────

#[tokio::test]
async fn series_is_ordered_and_capped() {
  let s = store().await;
  let site = c(SF.0, SF.1);
  // Written out of order and longer than the window.
  s.insert_batch(aq_batch(site, 40..100, 50)).await.unwrap();
  s.insert_batch(aq_batch(site, 0..40, 50)).await.unwrap();

  let series = s.air_quality_series(site, FORECAST_HOURS).await.unwrap();
  assert_eq!(series.len(), FORECAST_HOURS);
  assert!(series.windows(2).all(|w| w[0].forecast_time < w[1].forecast_time));
  assert_eq!(series[0].forecast_time, hour(0));
}

#[tokio::test]
async fn overlapping_ticks_serve_the_latest_ingestion() {
  let s = store().await;
  let site = c(SF.0, SF.1);
  s.insert_batch(aq_batch(site, 0..72, 50)).await.unwrap();
  s.insert_batch(aq_batch(site, 3..75, 80)).await.unwrap();

  // Both windows are kept on disk.
  assert_eq!(s.count(MeasurementKind::AirQuality).await.unwrap(), 144);

  let series = s.air_quality_series(site, FORECAST_HOURS).await.unwrap();
  assert_eq!(series.len(), 72);
  assert_eq!(series[0].aqi, 50);
  assert_eq!(series[3].aqi, 83);
}

#[tokio::test]
async fn values_round_trip_through_the_forecast_path() {
  let s = store().await;
  let site = c(SF.0, SF.1);
  s.insert_batch(aq_batch(site, 0..72, 60)).await.unwrap();
  s.insert_batch(allergen_batch(site, 0..72)).await.unwrap();

  let forecast = hyper_local_forecast(&s, site, &ForecastOptions::default())
    .await
    .unwrap();

  assert_eq!(forecast.distance_meters, 0.0);
  assert_eq!(forecast.latitude, SF.0);
  assert_eq!(forecast.longitude, SF.1);
  assert_eq!(forecast.air_quality_series.len(), 72);
  assert_eq!(forecast.allergen_series.len(), 72);

  let p = &forecast.air_quality_series[7];
  assert_eq!(p.forecast_time, hour(7));
  assert_eq!(p.aqi, 67);
  assert!((p.pm25.unwrap() - 12.25).abs() < 1e-9);
  assert_eq!(p.o3, None);

  let a = &forecast.allergen_series[7];
  assert_eq!(a.tree_pollen_count, Some(207));
  assert_eq!(a.grass_pollen_count, None);
}

#[tokio::test]
async fn forecast_far_from_any_site_is_not_found() {
  let s = store().await;
  s.insert_batch(aq_batch(c(SF.0, SF.1), 0..5, 50)).await.unwrap();

  let err = hyper_local_forecast(&s, c(46.7749, -122.4194), &ForecastOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound { .. }));
}
