//! The `ForecastStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `haze-store-sqlite`).
//! The API and the ingestion pipeline depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  geo::{BoundingBox, Coordinate},
  measurement::{
    AirQualityPoint, AllergenPoint, MeasurementBatch, MeasurementKind,
    StoredSite,
  },
};

/// Abstraction over a spatially indexed measurement store.
///
/// Writes are append-only: rows are inserted by ingestion and never updated.
/// Each call runs in its own short-lived transaction, so a batch being
/// written is never partially visible to a concurrent read.
pub trait ForecastStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Trivial round-trip used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert every record of `batch` in a single transaction and return the
  /// number of rows written. On failure nothing from the batch is kept.
  ///
  /// Locations are snapped to the storage grid and `ingestion_timestamp` is
  /// set by the store.
  fn insert_batch(
    &self,
    batch: MeasurementBatch,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete every row of either kind whose `forecast_time` is strictly
  /// before `cutoff`. Returns the number of rows removed.
  fn purge_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Distinct stored locations of `kind` inside `bbox`.
  fn sites_within(
    &self,
    kind: MeasurementKind,
    bbox: BoundingBox,
  ) -> impl Future<Output = Result<Vec<StoredSite>, Self::Error>> + Send + '_;

  /// Air-quality points recorded at exactly `location`, ascending by
  /// `forecast_time`, at most `limit` of them.
  ///
  /// When several rows share a `forecast_time`, only the most recently
  /// ingested one is returned.
  fn air_quality_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AirQualityPoint>, Self::Error>> + Send + '_;

  /// Allergen counterpart of [`ForecastStore::air_quality_series`].
  fn allergen_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AllergenPoint>, Self::Error>> + Send + '_;

  /// Total number of stored rows of `kind`.
  fn count(
    &self,
    kind: MeasurementKind,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
