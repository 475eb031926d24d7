//! Ingestion targets and tunables.

use std::time::Duration;

use haze_core::{geo::Coordinate, measurement::MeasurementKind};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AQI_API_URL: &str = "https://mock-aqi-api.com/forecast";
pub const DEFAULT_ALLERGEN_API_URL: &str = "https://mock-allergen-api.com/pollen";

/// A fixed location forecasts are ingested for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
  pub name:     String,
  pub location: Coordinate,
}

impl Site {
  /// San Francisco and Los Angeles.
  pub fn defaults() -> Vec<Site> {
    vec![
      Site {
        name:     "San Francisco".into(),
        location: Coordinate { latitude: 37.7749, longitude: -122.4194 },
      },
      Site {
        name:     "Los Angeles".into(),
        location: Coordinate { latitude: 34.0522, longitude: -118.2437 },
      },
    ]
  }
}

/// A provider feed: which measurement kind it yields and where it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
  pub kind: MeasurementKind,
  pub url:  String,
}

impl Feed {
  pub fn new(kind: MeasurementKind, url: impl Into<String>) -> Self {
    Self { kind, url: url.into() }
  }

  /// One feed per measurement kind, pointed at the given endpoints.
  pub fn pair(aqi_url: impl Into<String>, allergen_url: impl Into<String>) -> Vec<Feed> {
    vec![
      Feed::new(MeasurementKind::AirQuality, aqi_url),
      Feed::new(MeasurementKind::Allergen, allergen_url),
    ]
  }
}

/// Everything a [`Pipeline`](crate::Pipeline) needs besides its store and
/// provider.
#[derive(Debug, Clone)]
pub struct IngestConfig {
  pub sites:         Vec<Site>,
  pub feeds:         Vec<Feed>,
  /// Upper bound on a single provider fetch.
  pub fetch_timeout: Duration,
  /// How far before the current hour forecasts are kept. After each tick,
  /// rows whose `forecast_time` is earlier than the run's window start minus
  /// this are purged; zero keeps only current and future hours. `None`
  /// disables the purge.
  pub retention:     Option<Duration>,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      sites:         Site::defaults(),
      feeds:         Feed::pair(DEFAULT_AQI_API_URL, DEFAULT_ALLERGEN_API_URL),
      fetch_timeout: Duration::from_secs(10),
      retention:     Some(Duration::ZERO),
    }
  }
}
