//! Error types for `haze-ingest`.

use std::time::Duration;

use thiserror::Error;

/// A failure reported by an upstream forecast provider.
#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  #[error("malformed response from {url}: {message}")]
  Malformed { url: String, message: String },
}

/// A failure ingesting one (site, feed) pair.
#[derive(Debug, Error)]
pub enum IngestError {
  #[error("fetch failed: {0}")]
  Fetch(#[from] ProviderError),

  #[error("fetch from {url} timed out after {timeout:?}")]
  FetchTimeout { url: String, timeout: Duration },

  #[error("record {index}: {reason}")]
  Transform { index: usize, reason: String },

  #[error("load failed: {0}")]
  Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}
