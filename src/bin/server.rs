//! pricecast Server - per-symbol price forecasting over HTTP
//!
//! Serves forecasts from in-memory models and retrains them in the
//! background. Metrics are pushed via structured JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! ML_PORT=5001 RETRAIN_INTERVAL_SECS=30 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `ML_PORT` / `PORT` - Listening port (default: 5001)
//! - `RETRAIN_INTERVAL_SECS` - Seconds between background retrains (default: 30)
//! - `RETRAIN_MIN_OBSERVATIONS` - Observations needed before retraining (default: 20)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)

use anyhow::{Context, Result};
use clap::Parser;
use pricecast::application::system::Application;
use pricecast::config::Config;
use pricecast::interfaces::http;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listening port (overrides ML_PORT/PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (overrides BIND_ADDRESS)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("pricecast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    info!(
        "Configuration loaded: retrain every {}s (min {} observations), {} trees",
        config.scheduler.interval_secs, config.scheduler.min_observations, config.model.n_trees
    );

    let app = Application::build(config.clone())?;
    let handle = app.start();
    info!("Background tasks running: {:?}", handle.background_tasks());

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, http::router(handle.service.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("HTTP server failed")?;

    handle.shutdown().await;
    Ok(())
}
