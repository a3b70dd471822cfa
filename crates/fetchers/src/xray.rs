//! GOES X-ray flux at 10-minute cadence.
//!
//! Keeps only samples whose minute is 5 mod 10 and merges the short
//! (0.05-0.4 nm) and long (0.1-0.8 nm) channels into one fixed-width row
//! per timestamp. The `00000` columns are sentinels the client skips.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use hamclock_common::series::fit_window;
use hamclock_common::textfmt::sci;
use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::client::get_json;

const XRAY_URL: &str = "https://services.swpc.noaa.gov/json/goes/primary/xrays-1-day.json";

const XRAY_WINDOW: usize = 150;

#[derive(Debug, Deserialize)]
pub struct XrayEntry {
    pub time_tag: String,
    pub energy: Option<String>,
    pub flux: f64,
}

/// Transform the raw JSON entries into formatted artifact rows.
pub fn format_rows(entries: &[XrayEntry]) -> Vec<String> {
    use chrono::{Datelike, Timelike};

    let mut short: BTreeMap<(i32, u32, u32, u32), f64> = BTreeMap::new();
    let mut long: BTreeMap<(i32, u32, u32, u32), f64> = BTreeMap::new();

    for entry in entries {
        let tag = entry.time_tag.trim_end_matches('Z');
        let Ok(dt) = NaiveDateTime::parse_from_str(tag, "%Y-%m-%dT%H:%M:%S") else {
            continue;
        };
        if dt.minute() % 10 != 5 {
            continue;
        }
        let key = (dt.year(), dt.month(), dt.day(), dt.hour() * 100 + dt.minute());
        match entry.energy.as_deref() {
            Some("0.05-0.4nm") => {
                short.insert(key, entry.flux);
            }
            Some("0.1-0.8nm") => {
                long.insert(key, entry.flux);
            }
            _ => {}
        }
    }

    let mut keys: Vec<_> = short.keys().chain(long.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    keys.into_iter()
        .map(|key| {
            let (year, month, day, hhmm) = key;
            let s = short.get(&key).copied().unwrap_or(0.0);
            let l = long.get(&key).copied().unwrap_or(0.0);
            format!(
                "{year:4} {month:>2} {day:>2}  {hhmm:04}   00000  00000     {:>8}    {:>8}",
                sci(s),
                sci(l)
            )
        })
        .collect()
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let entries: Vec<XrayEntry> = get_json(client, XRAY_URL, Duration::from_secs(10)).await?;
    let rows = format_rows(&entries);
    if rows.is_empty() {
        return Err(FetchError::Parse("no 10-minute x-ray samples".into()));
    }

    let first = rows[0].clone();
    let rows = fit_window(&rows, XRAY_WINDOW, first);
    let mut out = rows.join("\n");
    out.push('\n');
    fsio::write_atomic(&layout.xray(), out.as_bytes())?;

    info!(rows = XRAY_WINDOW, "x-ray series updated");
    Ok(())
}
