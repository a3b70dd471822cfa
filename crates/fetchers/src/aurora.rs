//! Auroral activity: single scalar per refresh, rolling 48-point series.
//!
//! The upstream is a gridded probability forecast; the client wants one
//! number per timestamp, so each refresh records the maximum cell
//! probability and appends it to a history keyed by forecast time.

use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use chrono::DateTime;
use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::client::get_json;

const AURORA_URL: &str = "https://services.swpc.noaa.gov/json/ovation_aurora_latest.json";

const AURORA_WINDOW: usize = 48;
/// Backfill spacing when the history is too short for the client's
/// freshness check.
const BACKFILL_STEP: i64 = 1800;
const MIN_POINTS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct OvationForecast {
    #[serde(rename = "Forecast Time")]
    pub forecast_time: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<[f64; 3]>,
}

/// Maximum cell probability over the whole forecast grid.
pub fn max_probability(forecast: &OvationForecast) -> i64 {
    forecast
        .coordinates
        .iter()
        .map(|c| c[2])
        .fold(0.0_f64, f64::max) as i64
}

/// Merge the new observation into the history and shape it to the rolling
/// window.
pub fn update_history(
    mut history: BTreeMap<i64, String>,
    ts: i64,
    probability: i64,
) -> BTreeMap<i64, String> {
    history.insert(ts, probability.to_string());

    if history.len() < MIN_POINTS {
        let oldest = *history.keys().next().expect("just inserted");
        let missing = MIN_POINTS - history.len();
        for i in 0..missing {
            history.insert(oldest - (i as i64 + 1) * BACKFILL_STEP, "0".to_string());
        }
    }

    while history.len() > AURORA_WINDOW {
        let oldest = *history.keys().next().expect("non-empty");
        history.remove(&oldest);
    }
    history
}

fn load_history(path: &std::path::Path) -> BTreeMap<i64, String> {
    let mut history = BTreeMap::new();
    if let Ok(text) = fs::read_to_string(path) {
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            if let (Some(ts), Some(v)) = (parts.next(), parts.next()) {
                if let Ok(ts) = ts.parse::<i64>() {
                    history.insert(ts, v.to_string());
                }
            }
        }
    }
    history
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let forecast: OvationForecast = get_json(client, AURORA_URL, Duration::from_secs(10)).await?;
    let probability = max_probability(&forecast);

    let ts = forecast
        .forecast_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    let history = update_history(load_history(&layout.aurora()), ts, probability);

    let mut out = String::new();
    for (ts, v) in &history {
        out.push_str(&format!("{ts} {v}\n"));
    }
    fsio::write_atomic(&layout.aurora(), out.as_bytes())?;

    info!(points = history.len(), probability, "aurora series updated");
    Ok(())
}
