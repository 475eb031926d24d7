//! One ingestion tick: fetch → transform → load, per (site, feed) pair.

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound as _, Utc};
use haze_core::store::ForecastStore;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{Feed, IngestConfig, IngestError, Provider, Site, transform::transform};

/// Outcome of a single [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
  pub run_id:     Uuid,
  pub started_at: DateTime<Utc>,
  /// Rows committed across all pairs.
  pub written:    usize,
  /// Pairs whose batch committed.
  pub succeeded:  usize,
  /// Pairs that failed to fetch, transform, or load.
  pub failed:     usize,
  /// Rows removed by the retention purge, if one ran and succeeded.
  pub purged:     Option<usize>,
}

impl IngestReport {
  /// True when there was work to do and none of it succeeded.
  pub fn is_total_failure(&self) -> bool { self.succeeded == 0 && self.failed > 0 }
}

/// Fetches, transforms, and loads forecasts for every configured pair.
pub struct Pipeline<S, P> {
  store:    Arc<S>,
  provider: P,
  config:   IngestConfig,
}

impl<S, P> Pipeline<S, P>
where
  S: ForecastStore,
  P: Provider,
{
  pub fn new(store: Arc<S>, provider: P, config: IngestConfig) -> Self {
    Self { store, provider, config }
  }

  pub fn config(&self) -> &IngestConfig { &self.config }

  /// Run one tick starting now.
  pub async fn run(&self) -> IngestReport { self.run_at(Utc::now()).await }

  /// Run one tick as if the clock read `now`.
  ///
  /// Pairs are processed sequentially. A failing pair is logged and counted
  /// but never aborts the others.
  #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
  pub async fn run_at(&self, now: DateTime<Utc>) -> IngestReport {
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));

    // Align windows on the hour so successive ticks overlap exactly.
    let start = now.duration_trunc(Duration::hours(1)).unwrap_or(now);

    info!(
      %start,
      sites = self.config.sites.len(),
      feeds = self.config.feeds.len(),
      "ingestion run started"
    );

    let mut report = IngestReport {
      run_id,
      started_at: now,
      written: 0,
      succeeded: 0,
      failed: 0,
      purged: None,
    };

    for site in &self.config.sites {
      for feed in &self.config.feeds {
        match self.run_pair(site, feed, start).await {
          Ok(written) => {
            info!(site = %site.name, feed = %feed.kind, written, "batch loaded");
            report.written += written;
            report.succeeded += 1;
          }
          Err(e) => {
            warn!(
              site = %site.name,
              feed = %feed.kind,
              url = %feed.url,
              error = %e,
              "batch failed; continuing with remaining pairs"
            );
            report.failed += 1;
          }
        }
      }
    }

    if let Some(retention) = self.config.retention {
      match purge_cutoff(start, retention) {
        Some(cutoff) => match self.store.purge_before(cutoff).await {
          Ok(purged) => report.purged = Some(purged),
          Err(e) => warn!(error = %e, "retention purge failed"),
        },
        None => warn!(?retention, "retention cutoff out of range; skipping purge"),
      }
    }

    if report.is_total_failure() {
      error!(failed = report.failed, "ingestion run failed for every pair");
    } else {
      info!(
        written = report.written,
        succeeded = report.succeeded,
        failed = report.failed,
        purged = ?report.purged,
        "ingestion run complete"
      );
    }

    report
  }

  async fn run_pair(
    &self,
    site: &Site,
    feed: &Feed,
    start: DateTime<Utc>,
  ) -> Result<usize, IngestError> {
    let timeout = self.config.fetch_timeout;
    let raw = tokio::time::timeout(timeout, self.provider.fetch(feed, site, start))
      .await
      .map_err(|_| IngestError::FetchTimeout { url: feed.url.clone(), timeout })??;

    let batch = transform(feed.kind, raw)?;

    self
      .store
      .insert_batch(batch)
      .await
      .map_err(|e| IngestError::Load(Box::new(e)))
  }
}

/// Oldest `forecast_time` kept by a purge for a window starting at `start`.
fn purge_cutoff(start: DateTime<Utc>, retention: std::time::Duration) -> Option<DateTime<Utc>> {
  let retention = Duration::from_std(retention).ok()?;
  start.checked_sub_signed(retention)
}
