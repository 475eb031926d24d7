//! Fixed-interval driver for the ingestion [`Pipeline`].
//!
//! A single spawned task owns the pipeline. Runs execute inline in that task,
//! so two runs can never overlap; ticks that come due while a run is still
//! in flight are skipped rather than queued.

use std::{fmt, sync::Arc, time::Duration};

use haze_core::store::ForecastStore;
use serde::Serialize;
use tokio::{
  sync::{oneshot, watch},
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{IngestReport, Pipeline, Provider};

/// Timing of the scheduled runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
  /// Delay before the first run, giving the store time to warm up.
  pub initial_delay: Duration,
  /// Period between run starts.
  pub interval:      Duration,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      initial_delay: Duration::from_secs(5),
      interval:      Duration::from_secs(3 * 60 * 60),
    }
  }
}

/// What the scheduler task is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
  /// Waiting for the first run.
  Starting,
  /// Between runs.
  Idle,
  /// A run is in flight.
  Running,
  /// The task has exited.
  Stopped,
}

impl fmt::Display for SchedulerState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Starting => "starting",
      Self::Idle => "idle",
      Self::Running => "running",
      Self::Stopped => "stopped",
    })
  }
}

/// Snapshot published by the scheduler task after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
  pub state:       SchedulerState,
  /// Completed runs since startup.
  pub runs:        u64,
  pub last_report: Option<IngestReport>,
}

/// Read-only view of a running scheduler; cheap to clone.
#[derive(Debug, Clone)]
pub struct SchedulerMonitor {
  status: watch::Receiver<SchedulerStatus>,
}

impl SchedulerMonitor {
  pub fn status(&self) -> SchedulerStatus { self.status.borrow().clone() }

  /// Wait until the published status satisfies `f`.
  pub async fn wait_for(&mut self, f: impl FnMut(&SchedulerStatus) -> bool) -> SchedulerStatus {
    let waited = self.status.wait_for(f).await.map(|status| (*status).clone());
    // On error the task is gone; report whatever it published last.
    waited.unwrap_or_else(|_| self.status())
  }

  /// A monitor for a scheduler that was never started.
  pub fn disabled() -> Self {
    let (_tx, status) = watch::channel(SchedulerStatus {
      state:       SchedulerState::Stopped,
      runs:        0,
      last_report: None,
    });
    Self { status }
  }
}

/// Owner handle for the scheduler task.
pub struct SchedulerHandle {
  shutdown: oneshot::Sender<()>,
  task:     JoinHandle<()>,
  monitor:  SchedulerMonitor,
}

impl SchedulerHandle {
  pub fn monitor(&self) -> SchedulerMonitor { self.monitor.clone() }

  /// Stop the timer and wait up to `drain` for an in-flight run to finish.
  ///
  /// A run still going after `drain` is aborted; its current batch either
  /// commits or rolls back as a unit.
  pub async fn shutdown(self, drain: Duration) {
    let Self { shutdown, mut task, .. } = self;
    // The task may already have exited; nothing to signal then.
    let _ = shutdown.send(());

    match tokio::time::timeout(drain, &mut task).await {
      Ok(Ok(())) => info!("ingestion scheduler stopped"),
      Ok(Err(e)) => warn!(error = %e, "ingestion scheduler task failed"),
      Err(_) => {
        warn!(?drain, "ingestion run did not drain in time; aborting");
        task.abort();
      }
    }
  }
}

/// Starts the periodic ingestion task.
pub struct Scheduler;

impl Scheduler {
  /// Spawn the scheduler onto the current tokio runtime.
  pub fn start<S, P>(pipeline: Pipeline<S, P>, config: SchedulerConfig) -> SchedulerHandle
  where
    S: ForecastStore + 'static,
    P: Provider + 'static,
  {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (status_tx, status_rx) = watch::channel(SchedulerStatus {
      state:       SchedulerState::Starting,
      runs:        0,
      last_report: None,
    });

    info!(
      initial_delay = ?config.initial_delay,
      interval = ?config.interval,
      "ingestion scheduler started"
    );

    let task = tokio::spawn(run_loop(Arc::new(pipeline), config, shutdown_rx, status_tx));

    SchedulerHandle {
      shutdown: shutdown_tx,
      task,
      monitor: SchedulerMonitor { status: status_rx },
    }
  }
}

async fn run_loop<S, P>(
  pipeline: Arc<Pipeline<S, P>>,
  config: SchedulerConfig,
  mut shutdown: oneshot::Receiver<()>,
  status: watch::Sender<SchedulerStatus>,
) where
  S: ForecastStore,
  P: Provider,
{
  let mut ticker =
    tokio::time::interval_at(Instant::now() + config.initial_delay, config.interval);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

  loop {
    tokio::select! {
      biased;
      // Either an explicit signal or the handle being dropped.
      _ = &mut shutdown => break,
      _ = ticker.tick() => {}
    }

    status.send_modify(|s| s.state = SchedulerState::Running);
    let report = pipeline.run().await;
    status.send_modify(|s| {
      s.state = SchedulerState::Idle;
      s.runs += 1;
      s.last_report = Some(report);
    });
  }

  status.send_modify(|s| s.state = SchedulerState::Stopped);
}
