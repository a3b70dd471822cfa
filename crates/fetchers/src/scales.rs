//! NOAA space-weather scales (R / S / G, current plus 3-day outlook).

use std::time::Duration;

use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::client::get_json;

const NOAA_SCALES_URL: &str = "https://services.swpc.noaa.gov/products/noaa-scales.json";

/// Extract one scale level; the feed has carried both numeric and string
/// encodings over time.
fn scale_value(day: &Value, letter: &str) -> i64 {
    let entry = &day[letter];
    for key in ["value", "Scale"] {
        match &entry[key] {
            Value::Number(n) => return n.as_i64().unwrap_or(0),
            Value::String(s) => {
                if let Ok(v) = s.parse::<i64>() {
                    return v;
                }
            }
            _ => {}
        }
    }
    0
}

/// Format the artifact body: one line per scale, current value followed
/// by the three outlook days.
pub fn format_scales(data: &Value) -> String {
    let mut out = String::new();
    for letter in ["R", "S", "G"] {
        let current = scale_value(&data["0"], letter);
        let d1 = scale_value(&data["1"], letter);
        let d2 = scale_value(&data["2"], letter);
        let d3 = scale_value(&data["3"], letter);
        out.push_str(&format!("{letter}  {current} {d1} {d2} {d3}\n"));
    }
    out
}

/// The client's ranking coefficients are not published upstream; serve
/// the fixed identity table the historical service used.
fn rank_coefficients() -> String {
    let mut out = String::from("# index a b c\n");
    for i in 0..10 {
        out.push_str(&format!("{i} 0 1 0\n"));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let data: Value = get_json(client, NOAA_SCALES_URL, Duration::from_secs(10)).await?;
    fsio::write_atomic(&layout.noaa_scales(), format_scales(&data).as_bytes())?;

    if !layout.rank_coeffs().exists() {
        fsio::write_atomic(&layout.rank_coeffs(), rank_coefficients().as_bytes())?;
    }

    info!("space weather scales updated");
    Ok(())
}
