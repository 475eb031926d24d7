//! Upstream forecast providers.
//!
//! Real upstream integrations are out of scope; [`SyntheticProvider`] stands
//! in for them with a deterministic diurnal curve.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use haze_core::measurement::MeasurementKind;
use serde::{Deserialize, Serialize};

use crate::{Feed, ProviderError, Site};

/// Number of hourly records a provider returns per fetch.
pub const WINDOW_HOURS: i64 = 72;

/// One hourly record as delivered by a provider, before transformation.
///
/// Providers fill only the fields relevant to their feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
  pub latitude:               f64,
  pub longitude:              f64,
  pub forecast_time:          DateTime<Utc>,
  pub raw_aqi:                Option<i64>,
  pub raw_pm25:               Option<f64>,
  pub raw_o3:                 Option<f64>,
  pub raw_pollen_count:       Option<i64>,
  pub raw_grass_pollen_count: Option<i64>,
}

/// A source of raw forecast records.
pub trait Provider: Send + Sync {
  /// Fetch the forecast window for `site` from `feed`, starting at `start`.
  fn fetch<'a>(
    &'a self,
    feed: &'a Feed,
    site: &'a Site,
    start: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<RawRecord>, ProviderError>> + Send + 'a;
}

// ─── Synthetic provider ──────────────────────────────────────────────────────

/// Generates one record per hour for [`WINDOW_HOURS`] hours from `start`.
///
/// Values follow a smooth curve over `hour_offset mod 24`, so every day of
/// the window repeats the same profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
  /// Position within the day, in `[0, 1)`.
  fn time_factor(hour_offset: i64) -> f64 { (hour_offset % 24) as f64 / 24.0 }

  pub fn aqi(hour_offset: i64) -> i64 {
    let tf = Self::time_factor(hour_offset);
    50 + (20.0 * (0.5 + 0.5 * (1.0 - (tf - 0.5).abs()))) as i64
  }

  pub fn pm25(hour_offset: i64) -> f64 { 10.5 + Self::time_factor(hour_offset) * 5.0 }

  pub fn pollen_count(hour_offset: i64) -> i64 {
    let tf = Self::time_factor(hour_offset);
    150 + (100.0 * (0.5 + 0.5 * tf)) as i64
  }

  pub fn generate(kind: MeasurementKind, site: &Site, start: DateTime<Utc>) -> Vec<RawRecord> {
    (0..WINDOW_HOURS)
      .map(|h| {
        let base = RawRecord {
          latitude: site.location.latitude,
          longitude: site.location.longitude,
          forecast_time: start + Duration::hours(h),
          ..RawRecord::default()
        };
        match kind {
          MeasurementKind::AirQuality => RawRecord {
            raw_aqi: Some(Self::aqi(h)),
            raw_pm25: Some(Self::pm25(h)),
            ..base
          },
          MeasurementKind::Allergen => RawRecord {
            raw_pollen_count: Some(Self::pollen_count(h)),
            ..base
          },
        }
      })
      .collect()
  }
}

impl Provider for SyntheticProvider {
  async fn fetch<'a>(
    &'a self,
    feed: &'a Feed,
    site: &'a Site,
    start: DateTime<Utc>,
  ) -> Result<Vec<RawRecord>, ProviderError> {
    tracing::debug!(
      url = %feed.url,
      site = %site.name,
      latitude = site.location.latitude,
      longitude = site.location.longitude,
      "fetching synthetic forecast"
    );
    Ok(Self::generate(feed.kind, site, start))
  }
}
