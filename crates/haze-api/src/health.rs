//! Liveness and health endpoints.

use axum::{Json, extract::State, http::StatusCode};
use haze_core::store::ForecastStore;
use haze_ingest::{SchedulerState, SchedulerStatus};
use serde::Serialize;
use serde_json::{Value, json};

use crate::AppState;

/// `GET /`
pub async fn root() -> Json<Value> {
  Json(json!({
    "message": "Air Quality API is running. Check /health for detailed status."
  }))
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
  pub api_status:          &'static str,
  pub database_connection: String,
  pub ingestion_scheduler: String,
  pub environment:         String,
}

/// `GET /health`: 200 when the store answers a round-trip, 503 otherwise.
pub async fn handler<S>(State(state): State<AppState<S>>) -> (StatusCode, Json<HealthReport>)
where
  S: ForecastStore + 'static,
{
  let timeout = state.settings.query_timeout;
  let database = match tokio::time::timeout(timeout, state.store.ping()).await {
    Ok(Ok(())) => Ok(()),
    Ok(Err(e)) => Err(format!("DOWN (unreachable): {e}")),
    Err(_) => Err(format!("DOWN (timeout): no response within {timeout:?}")),
  };

  let status = match &database {
    Ok(()) => StatusCode::OK,
    Err(message) => {
      tracing::warn!(%message, "health check failed");
      StatusCode::SERVICE_UNAVAILABLE
    }
  };

  let report = HealthReport {
    api_status:          "UP",
    database_connection: database.err().unwrap_or_else(|| "UP".to_owned()),
    ingestion_scheduler: describe(&state.scheduler.status()),
    environment:         state.settings.environment.clone(),
  };
  (status, Json(report))
}

fn describe(status: &SchedulerStatus) -> String {
  match (&status.state, &status.last_report) {
    (SchedulerState::Idle, Some(r)) => format!(
      "idle (last run: {} succeeded, {} failed, {} rows)",
      r.succeeded, r.failed, r.written
    ),
    (state, _) => state.to_string(),
  }
}
