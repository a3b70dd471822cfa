//! Periodic fan-out over every upstream fetcher.
//!
//! One tick runs all fetchers concurrently; a failing feed is logged and
//! never aborts the tick, so a dead upstream only freezes its own
//! artifact. Startup runs one immediate tick; shutdown lets the in-flight
//! tick finish.

use std::future::Future;
use std::time::Duration;

use hamclock_common::{ArtifactLayout, FetchResult};
use reqwest::Client;
use tokio::sync::broadcast;
use tracing::{error, info};

async fn run_feed<F>(name: &'static str, fut: F)
where
    F: Future<Output = FetchResult<()>>,
{
    match fut.await {
        Ok(()) => {}
        Err(e) => error!(feed = name, error = %e, "feed refresh failed, keeping previous artifact"),
    }
}

/// One refresh cycle over the whole catalogue.
pub async fn tick(client: &Client, layout: &ArtifactLayout) {
    let started = std::time::Instant::now();

    futures::join!(
        run_feed("solar-indices", fetchers::solar::refresh(client, layout)),
        run_feed("planetary-k", fetchers::kp::refresh(client, layout)),
        run_feed("xray", fetchers::xray::refresh(client, layout)),
        run_feed("solar-wind", fetchers::solarwind::refresh(client, layout)),
        run_feed("noaa-scales", fetchers::scales::refresh(client, layout)),
        run_feed("aurora", fetchers::aurora::refresh(client, layout)),
        run_feed("country-prefix", fetchers::cty::refresh(client, layout)),
        run_feed("dst", fetchers::dst::refresh(client, layout)),
        run_feed("onta", fetchers::onta::refresh(client, layout)),
        run_feed("dxpeditions", fetchers::dxpeds::refresh(client, layout)),
        run_feed("contests", fetchers::contests::refresh(client, layout)),
        run_feed("drap", fetchers::drap::refresh(client, layout)),
        run_feed("world-weather", fetchers::worldwx::refresh(client, layout)),
    );

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "refresh tick complete");
}

/// Run forever: immediate first tick, then one tick per period until the
/// shutdown signal arrives.
pub async fn run_forever(
    client: Client,
    layout: ArtifactLayout,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(period_secs = period.as_secs(), "scheduler started");
    tick(&client, &layout).await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("scheduler shutting down");
                break;
            }
            _ = tokio::time::sleep(period) => {
                tick(&client, &layout).await;
            }
        }
    }
}
