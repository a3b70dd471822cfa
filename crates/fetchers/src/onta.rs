//! On-the-air activations: POTA and SOTA spots merged into one CSV.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::BROWSER_UA;

const POTA_URL: &str = "https://api.pota.app/spot/activator";
const SOTA_URL: &str = "https://api-db2.sota.org.uk/api/spots/50";

const CSV_HEADER: &str = "#call,Hz,unix,mode,grid,lat,lng,park,org";

fn str_field(v: &Value, key: &str) -> Option<String> {
    v[key].as_str().map(str::to_string)
}

fn num_field(v: &Value, key: &str) -> Option<f64> {
    match &v[key] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_spot_time(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    None
}

/// SOTA spot list -> CSV lines. Frequencies arrive in MHz; the summit
/// list carries no coordinates.
pub fn parse_sota(spots: &Value, now: i64) -> Vec<String> {
    let Some(list) = spots.as_array() else { return Vec::new() };
    list.iter()
        .filter_map(|s| {
            let call = str_field(s, "activatorCallsign").or_else(|| str_field(s, "callsign"))?;
            let hz = (num_field(s, "frequency").unwrap_or(0.0) * 1e6) as i64;
            let uts = str_field(s, "timeStamp")
                .and_then(|t| parse_spot_time(&t))
                .unwrap_or(now);
            let mode = str_field(s, "mode").unwrap_or_else(|| "CW".into());
            let park = str_field(s, "summitCode").unwrap_or_else(|| "Unknown".into());
            Some(format!("{call},{hz},{uts},{mode},,0.00000,0.00000,{park},SOTA"))
        })
        .collect()
}

/// POTA spot list -> CSV lines. Frequencies arrive in kHz.
pub fn parse_pota(spots: &Value, now: i64) -> Vec<String> {
    let Some(list) = spots.as_array() else { return Vec::new() };
    list.iter()
        .filter_map(|s| {
            let call = str_field(s, "activator")?;
            let hz = (num_field(s, "frequency").unwrap_or(0.0) * 1000.0) as i64;
            let uts = str_field(s, "spotTime")
                .and_then(|t| parse_spot_time(&t))
                .unwrap_or(now);
            let mode = str_field(s, "mode").unwrap_or_else(|| "CW".into());
            let lat = num_field(s, "latitude").unwrap_or(0.0);
            let lng = num_field(s, "longitude").unwrap_or(0.0);
            let park = str_field(s, "reference").unwrap_or_else(|| "Unknown".into());
            Some(format!("{call},{hz},{uts},{mode},,{lat:.5},{lng:.5},{park},POTA"))
        })
        .collect()
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let now = Utc::now().timestamp();

    // The two sources fail independently; a partial merge still serves.
    let sota = match fetch_json(client, SOTA_URL).await {
        Ok(v) => parse_sota(&v, now),
        Err(e) => {
            warn!(error = %e, "SOTA fetch failed");
            Vec::new()
        }
    };
    let pota = match fetch_json(client, POTA_URL).await {
        Ok(v) => parse_pota(&v, now),
        Err(e) => {
            warn!(error = %e, "POTA fetch failed");
            Vec::new()
        }
    };

    let mut out = String::from(CSV_HEADER);
    for line in sota.iter().chain(pota.iter()) {
        out.push('\n');
        out.push_str(line);
    }
    out.push('\n');
    fsio::write_atomic(&layout.onta(), out.as_bytes())?;

    info!(sota = sota.len(), pota = pota.len(), "activation spots updated");
    Ok(())
}

async fn fetch_json(client: &Client, url: &str) -> FetchResult<Value> {
    let resp = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_UA)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(crate::client::map_reqwest)?;
    if !resp.status().is_success() {
        return Err(hamclock_common::FetchError::HttpStatus(resp.status().as_u16()));
    }
    let text = resp.text().await.map_err(crate::client::map_reqwest)?;
    serde_json::from_str(&text).map_err(|e| hamclock_common::FetchError::Parse(e.to_string()))
}
