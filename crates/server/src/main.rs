// crates/server/src/main.rs
//! Jobwatch server binary.
//!
//! Serves two observer paths over one progress-record directory: a blocking
//! completion endpoint and a per-job SSE progress stream. The record files
//! are written by an external producer; this process only ever reads them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobwatch_core::{FileProgressStore, WatchConfig};
use jobwatch_server::{create_app, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 4870;

#[derive(Debug, Parser)]
#[command(name = "jobwatch", about = "Watch background job progress records and notify observers")]
struct Args {
    /// Directory holding one <job>.json progress record per job.
    #[arg(long, default_value = "./progress")]
    store_dir: PathBuf,

    /// Listen port. Falls back to JOBWATCH_PORT, then 4870.
    #[arg(long)]
    port: Option<u16>,

    /// Poll cadence of the live progress stream, in milliseconds.
    #[arg(long, default_value_t = 200)]
    poll_interval_ms: u64,

    /// Poll cadence of the blocking completion path, in milliseconds.
    #[arg(long, default_value_t = 200)]
    completion_interval_ms: u64,

    /// Give up on a job after this many consecutive unreadable polls.
    /// Unset means retry forever.
    #[arg(long)]
    unavailable_cap: Option<u32>,
}

/// Get the server port from flag, environment, or default.
fn resolve_port(flag: Option<u16>) -> u16 {
    flag.or_else(|| {
        std::env::var("JOBWATCH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
    })
    .unwrap_or(DEFAULT_PORT)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = WatchConfig::new(Duration::from_millis(args.completion_interval_ms))
        .with_stream_interval(Duration::from_millis(args.poll_interval_ms));
    if let Some(cap) = args.unavailable_cap {
        config = config.with_unavailable_cap(cap);
    }

    let store = Arc::new(FileProgressStore::new(&args.store_dir));
    let app = create_app(AppState::new(store, config));

    let addr = SocketAddr::from(([127, 0, 0, 1], resolve_port(args.port)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        store_dir = %args.store_dir.display(),
        "jobwatch listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
