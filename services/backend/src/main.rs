//! HamClock replacement backend.
//!
//! One process serves the client's legacy CGI-style HTTP surface and runs
//! the periodic scheduler that keeps the artifact tree fresh:
//! - propagation maps and band conditions synthesized per request
//! - ~15 upstream feeds normalized into byte-exact client artifacts
//! - incremental global weather grid with a persistent cursor

use backend::{handlers, scheduler};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hamclock_common::ArtifactLayout;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use backend::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "backend")]
#[command(about = "HamClock replacement backend server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:9086")]
    listen: String,

    /// Artifact directory root
    #[arg(long, default_value = "data/processed_data")]
    data_dir: String,

    /// Seconds between scheduler ticks
    #[arg(long, default_value = "600")]
    refresh_secs: u64,

    /// Disable the background scheduler (serve existing artifacts only)
    #[arg(long)]
    no_scheduler: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("starting hamclock backend");

    let layout = ArtifactLayout::new(&args.data_dir);
    std::fs::create_dir_all(layout.root())?;

    // All precomputation (colour tables, coordinate grids, base maps)
    // happens before the listener opens.
    let state = Arc::new(AppState::new(layout.clone()));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    if !args.no_scheduler {
        let client = state.client.clone();
        let period = Duration::from_secs(args.refresh_secs);
        let shutdown = shutdown_tx.subscribe();
        let scheduler_layout = layout.clone();
        tokio::spawn(async move {
            scheduler::run_forever(client, scheduler_layout, period, shutdown).await;
        });
    }

    let app = handlers::router(state);

    let addr: SocketAddr = args.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "listening");

    let shutdown_rx = shutdown_tx.subscribe();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let mut rx = shutdown_rx;
        rx.recv().await.ok();
    });

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
        shutdown_tx.send(()).ok();
    });

    server.await?;
    info!("server drained, exiting");
    Ok(())
}
