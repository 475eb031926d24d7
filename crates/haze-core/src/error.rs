//! Error types for `haze-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
  InvalidCoordinate {
    latitude:  f64,
    longitude: f64,
    reason:    &'static str,
  },

  /// No stored site lies within the search radius of the query point.
  #[error(
    "No forecast data found within {radius_m} meters of ({latitude}, {longitude})."
  )]
  NotFound {
    radius_m:  f64,
    latitude:  f64,
    longitude: f64,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
