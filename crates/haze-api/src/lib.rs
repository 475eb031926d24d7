//! JSON REST API for Haze.
//!
//! Exposes an axum [`Router`] backed by any
//! [`haze_core::store::ForecastStore`]. CORS, TLS, and transport concerns are
//! the caller's responsibility.

pub mod error;
pub mod forecast;
pub mod health;

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use haze_core::{forecast::ForecastOptions, store::ForecastStore};
use haze_ingest::SchedulerMonitor;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Request-path tunables.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Environment label reported by `/health`.
  pub environment:   String,
  /// Upper bound on any single store interaction made by a handler.
  pub query_timeout: Duration,
  pub forecast:      ForecastOptions,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      environment:   "development".to_owned(),
      query_timeout: Duration::from_secs(5),
      forecast:      ForecastOptions::default(),
    }
  }
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub scheduler: SchedulerMonitor,
  pub settings:  Arc<ApiSettings>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      scheduler: self.scheduler.clone(),
      settings:  self.settings.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: ForecastStore + 'static,
{
  Router::new()
    .route("/", get(health::root))
    .route("/health", get(health::handler::<S>))
    .route("/api/forecast", get(forecast::by_query::<S>))
    .route("/api/forecast/{lat}/{lon}", get(forecast::by_path::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
