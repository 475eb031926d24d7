//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store unavailable: {0}")]
  StoreUnavailable(String),
}

impl From<haze_core::Error> for ApiError {
  fn from(e: haze_core::Error) -> Self {
    match e {
      haze_core::Error::NotFound { .. } => ApiError::NotFound(e.to_string()),
      haze_core::Error::InvalidCoordinate { .. } => ApiError::BadRequest(e.to_string()),
      haze_core::Error::Store(inner) => ApiError::StoreUnavailable(inner.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::StoreUnavailable(m) => {
        tracing::error!(error = %m, "store unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, m.clone())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
