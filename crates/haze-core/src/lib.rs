//! Core types and trait definitions for the Haze forecast service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the measurement model, the spherical geometry, the [`ForecastStore`]
//! abstraction, and the two read paths built on top of it: nearest-site
//! resolution and time-series assembly.
//!
//! [`ForecastStore`]: store::ForecastStore

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod forecast;
pub mod geo;
pub mod measurement;
pub mod resolve;
pub mod series;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
