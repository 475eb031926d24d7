//! Periodic ingestion of provider forecasts into a [`ForecastStore`].
//!
//! A [`Pipeline`] performs one ingestion tick: for every configured site and
//! feed it fetches raw records from a [`Provider`], transforms them into
//! typed measurements, and loads each (site, feed) batch atomically. The
//! [`Scheduler`] drives the pipeline on a fixed interval from a single
//! background task.
//!
//! [`ForecastStore`]: haze_core::store::ForecastStore

#![allow(async_fn_in_trait)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod scheduler;
pub mod transform;

pub use config::{Feed, IngestConfig, Site};
pub use error::{IngestError, ProviderError};
pub use pipeline::{IngestReport, Pipeline};
pub use provider::{Provider, RawRecord, SyntheticProvider};
pub use scheduler::{
  Scheduler, SchedulerConfig, SchedulerHandle, SchedulerMonitor, SchedulerState,
  SchedulerStatus,
};
