//! Configuration and wiring for the `haze-server` binary.
//!
//! Settings come from an optional TOML file overlaid by environment
//! variables (`DATABASE_URL`, `PORT`, `RETENTION_HOURS`, ...). Every key
//! except `database_url` has a default.

use std::{sync::Arc, time::Duration};

use axum::http::{HeaderValue, Method, header};
use config::{ConfigBuilder, builder::DefaultState};
use haze_api::ApiSettings;
use haze_core::{forecast::ForecastOptions, store::ForecastStore};
use haze_ingest::{
  Feed, IngestConfig, IngestReport, Pipeline, Provider, SchedulerConfig, Site,
  config::{DEFAULT_ALLERGEN_API_URL, DEFAULT_AQI_API_URL},
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Upper bound on `retention_hours`: one leap year.
pub const MAX_RETENTION_HOURS: u64 = 366 * 24;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("DATABASE_URL is not set")]
  MissingDatabaseUrl,

  #[error("invalid configuration: {0}")]
  Invalid(String),

  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),
}

// ─── Server configuration ────────────────────────────────────────────────────

/// Top-level settings, deserialised from the `config` crate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub database_url:              Option<String>,
  pub host:                      String,
  pub port:                      u16,
  /// Environment label reported by `/health`.
  pub env:                       String,
  pub aqi_api_url:               String,
  pub allergen_api_url:          String,
  /// Comma-separated list of allowed browser origins.
  pub cors_origins:              String,
  pub ingest_interval_secs:      u64,
  pub ingest_initial_delay_secs: u64,
  pub fetch_timeout_secs:        u64,
  pub query_timeout_secs:        u64,
  /// Past hours kept before the current hour; zero drops every past-dated
  /// forecast.
  pub retention_hours:           u64,
  /// When false, nothing is ever purged.
  pub retention_enabled:         bool,
  pub shutdown_timeout_secs:     u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      database_url:              None,
      host:                      "0.0.0.0".to_owned(),
      port:                      8000,
      env:                       "development".to_owned(),
      aqi_api_url:               DEFAULT_AQI_API_URL.to_owned(),
      allergen_api_url:          DEFAULT_ALLERGEN_API_URL.to_owned(),
      cors_origins:              "http://localhost:3000,http://127.0.0.1:3000".to_owned(),
      ingest_interval_secs:      3 * 60 * 60,
      ingest_initial_delay_secs: 5,
      fetch_timeout_secs:        10,
      query_timeout_secs:        5,
      retention_hours:           0,
      retention_enabled:         true,
      shutdown_timeout_secs:     30,
    }
  }
}

/// Build a [`ServerConfig`] from `builder`'s sources and validate it.
pub fn load_config(builder: ConfigBuilder<DefaultState>) -> Result<ServerConfig, ConfigError> {
  let cfg: ServerConfig = builder.build()?.try_deserialize()?;
  cfg.validate()?;
  Ok(cfg)
}

impl ServerConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.database_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
      return Err(ConfigError::MissingDatabaseUrl);
    }
    for (key, value) in [
      ("ingest_interval_secs", self.ingest_interval_secs),
      ("ingest_initial_delay_secs", self.ingest_initial_delay_secs),
      ("fetch_timeout_secs", self.fetch_timeout_secs),
      ("query_timeout_secs", self.query_timeout_secs),
    ] {
      if value == 0 {
        return Err(ConfigError::Invalid(format!("{key} must be greater than zero")));
      }
    }
    if self.retention_hours > MAX_RETENTION_HOURS {
      return Err(ConfigError::Invalid(format!(
        "retention_hours must be at most {MAX_RETENTION_HOURS}, got {}",
        self.retention_hours
      )));
    }
    Ok(())
  }

  pub fn database_url(&self) -> Result<&str, ConfigError> {
    self.database_url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
  }

  /// The first few characters of the database URL, safe to log.
  pub fn database_url_prefix(&self) -> String {
    let url = self.database_url.as_deref().unwrap_or_default();
    let prefix: String = url.chars().take(20).collect();
    if prefix.len() < url.len() { format!("{prefix}...") } else { prefix }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn shutdown_timeout(&self) -> Duration { Duration::from_secs(self.shutdown_timeout_secs) }

  // ── Per-crate settings ──────────────────────────────────────────────────

  pub fn ingest_config(&self) -> IngestConfig {
    IngestConfig {
      sites:         Site::defaults(),
      feeds:         Feed::pair(&self.aqi_api_url, &self.allergen_api_url),
      fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
      retention:     self
        .retention_enabled
        .then(|| self.retention_hours.checked_mul(60 * 60).map(Duration::from_secs))
        .flatten(),
    }
  }

  pub fn scheduler_config(&self) -> SchedulerConfig {
    SchedulerConfig {
      initial_delay: Duration::from_secs(self.ingest_initial_delay_secs),
      interval:      Duration::from_secs(self.ingest_interval_secs),
    }
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      environment:   self.env.clone(),
      query_timeout: Duration::from_secs(self.query_timeout_secs),
      forecast:      ForecastOptions::default(),
    }
  }

  // ── CORS ────────────────────────────────────────────────────────────────

  /// Origins parsed from `cors_origins`. Malformed entries are logged and
  /// skipped.
  pub fn allowed_origins(&self) -> Vec<HeaderValue> {
    self
      .cors_origins
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .filter_map(|s| match s.parse::<HeaderValue>() {
        Ok(v) => Some(v),
        Err(e) => {
          tracing::warn!(origin = s, error = %e, "ignoring invalid CORS origin");
          None
        }
      })
      .collect()
  }

  pub fn cors_layer(&self) -> CorsLayer {
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(self.allowed_origins()))
      .allow_methods([Method::GET, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
      .allow_credentials(true)
  }
}

// ─── One-shot ingestion ──────────────────────────────────────────────────────

/// Run a single ingestion pass with `cfg`'s targets and return its report.
///
/// Used by `haze-server ingest`; the scheduler is not involved.
pub async fn ingest_once<S, P>(store: Arc<S>, provider: P, cfg: &ServerConfig) -> IngestReport
where
  S: ForecastStore,
  P: Provider,
{
  Pipeline::new(store, provider, cfg.ingest_config()).run().await
}
