//! haze-server binary.
//!
//! Reads `haze.toml` (or the path given with `--config`) overlaid by
//! environment variables and opens the SQLite store. By default it starts the
//! ingestion scheduler and serves the forecast API over HTTP until Ctrl-C or
//! SIGTERM.
//!
//! # One-shot ingestion
//!
//! To run a single ingestion pass and exit (non-zero if every pair failed):
//!
//! ```
//! cargo run -p haze-server -- ingest
//! ```

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use haze_api::AppState;
use haze_ingest::{Pipeline, Scheduler, SyntheticProvider};
use haze_server::{ServerConfig, ingest_once, load_config};
use haze_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Haze air-quality and allergen forecast server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "haze.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API and ingest on a schedule (the default).
  Serve,
  /// Run one ingestion pass and exit.
  Ingest,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let server_cfg = load_config(
    config::Config::builder()
      .add_source(config::File::from(cli.config).required(false))
      .add_source(config::Environment::default().try_parsing(true)),
  )
  .context("failed to load configuration")?;

  tracing::info!(
    database = %server_cfg.database_url_prefix(),
    environment = %server_cfg.env,
    "configuration loaded"
  );

  // Open SQLite store; the schema is created on first open.
  let store = SqliteStore::connect(server_cfg.database_url()?)
    .await
    .with_context(|| {
      format!("failed to open store at {}", server_cfg.database_url_prefix())
    })?;
  let store = Arc::new(store);

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await.map(|()| ExitCode::SUCCESS),
    Command::Ingest => {
      let report = ingest_once(store, SyntheticProvider, &server_cfg).await;
      tracing::info!(
        run_id = %report.run_id,
        written = report.written,
        succeeded = report.succeeded,
        failed = report.failed,
        purged = ?report.purged,
        "one-shot ingestion finished"
      );
      Ok(if report.is_total_failure() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
  }
}

async fn serve(store: Arc<SqliteStore>, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  // Start ingestion.
  let pipeline =
    Pipeline::new(store.clone(), SyntheticProvider, server_cfg.ingest_config());
  let scheduler = Scheduler::start(pipeline, server_cfg.scheduler_config());

  // Build application state.
  let state = AppState {
    store,
    scheduler: scheduler.monitor(),
    settings:  Arc::new(server_cfg.api_settings()),
  };

  let app = haze_api::router(state)
    .layer(server_cfg.cors_layer())
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = match TcpListener::bind(&address).await {
    Ok(listener) => listener,
    Err(e) => {
      scheduler.shutdown(server_cfg.shutdown_timeout()).await;
      return Err(e).with_context(|| format!("failed to bind {address}"));
    }
  };

  let served = axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await;

  // Drain ingestion even if the server itself failed.
  tracing::info!("shutting down");
  scheduler.shutdown(server_cfg.shutdown_timeout()).await;

  served.context("server error")
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {}
    _ = terminate => {}
  }
}
