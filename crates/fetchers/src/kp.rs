//! Planetary K index: 56 observed + 16 forecast values.

use std::time::Duration;

use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::client::get_text;

const GEO_INDICES_URL: &str =
    "https://services.swpc.noaa.gov/text/daily-geomagnetic-indices.txt";
const FORECAST_URL: &str = "https://services.swpc.noaa.gov/text/3-day-forecast.txt";

const KP_WINDOW: usize = 72;
const OBSERVED: usize = 56;
const FORECAST: usize = 16;

/// Observed planetary K values: the trailing eight columns of each daily
/// row, eight 3-hour bins per day.
pub fn parse_observed(text: &str) -> Vec<f64> {
    let tail = Regex::new(
        r"(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)$",
    )
    .expect("static regex");

    let mut values = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') || line.starts_with('#') || line.len() <= 60 {
            continue;
        }
        if let Some(caps) = tail.captures(line.trim_end()) {
            for i in 1..=8 {
                if let Ok(v) = caps[i].parse::<f64>() {
                    values.push(v);
                }
            }
        }
    }
    values
}

/// Forecast planetary K: the "NOAA Kp index breakdown" table, two days of
/// eight 3-hour bins each.
pub fn parse_forecast(text: &str) -> Vec<f64> {
    let mut day1 = Vec::new();
    let mut day2 = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        if line.contains("NOAA Kp index breakdown") {
            in_section = true;
            continue;
        }
        if in_section && line.contains("UT") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                if let (Ok(a), Ok(b)) = (parts[1].parse::<f64>(), parts[2].parse::<f64>()) {
                    day1.push(a);
                    day2.push(b);
                }
            }
        }
    }

    day1.truncate(8);
    day2.truncate(8);
    day1.extend(day2);
    day1
}

/// Combine observed + forecast into exactly 72 values.
pub fn combine(observed: &[f64], forecast: &[f64]) -> Vec<f64> {
    let obs_start = observed.len().saturating_sub(OBSERVED);
    let mut total: Vec<f64> = observed[obs_start..].to_vec();
    total.extend(forecast.iter().take(FORECAST));

    if total.len() > KP_WINDOW {
        total.drain(..total.len() - KP_WINDOW);
    }
    while total.len() < KP_WINDOW {
        total.push(total.last().copied().unwrap_or(0.0));
    }
    total
}

/// Render the artifact body: 72 lines of `%.2f` values.
pub fn format_kindex(observed: &[f64], forecast: &[f64]) -> String {
    let mut out = String::with_capacity(KP_WINDOW * 6);
    for v in combine(observed, forecast) {
        out.push_str(&format!("{v:.2}\n"));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let observed = match get_text(client, GEO_INDICES_URL, Duration::from_secs(10)).await {
        Ok(text) => parse_observed(&text),
        Err(e) => {
            warn!(error = %e, "observed Kp fetch failed, padding from forecast");
            Vec::new()
        }
    };
    let forecast = match get_text(client, FORECAST_URL, Duration::from_secs(10)).await {
        Ok(text) => parse_forecast(&text),
        Err(e) => {
            warn!(error = %e, "forecast Kp fetch failed");
            Vec::new()
        }
    };

    fsio::write_atomic(&layout.kindex(), format_kindex(&observed, &forecast).as_bytes())?;

    info!(observed = observed.len(), forecast = forecast.len(), "planetary K updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_rows_yield_eight_bins() {
        let line = format!(
            "2026 01 31 {:>30} 12   2.00  3.00  2.67  2.67  3.33  2.67  2.33  2.67",
            ""
        );
        let values = parse_observed(&line);
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 2.00);
        assert_eq!(values[7], 2.67);
    }

    #[test]
    fn forecast_section_flattens_day_major() {
        let text = "\
NOAA Kp index breakdown Feb 01-Feb 03 2026\n\
\n\
             Feb 01       Feb 02       Feb 03\n\
00-03UT       3.67         2.67         1.67\n\
03-06UT       3.00         2.33         1.33\n";
        let values = parse_forecast(text);
        assert_eq!(values, vec![3.67, 3.00, 2.67, 2.33]);
    }

    #[test]
    fn combined_window_is_always_72() {
        let observed: Vec<f64> = (0..80).map(|i| i as f64 / 10.0).collect();
        let forecast: Vec<f64> = (0..16).map(|i| i as f64).collect();
        assert_eq!(combine(&observed, &forecast).len(), 72);
        assert_eq!(combine(&[], &[]).len(), 72);
        assert_eq!(combine(&[1.5], &[]).len(), 72);
    }

    #[test]
    fn artifact_body_is_72_two_decimal_lines() {
        let observed: Vec<f64> = (0..60).map(|i| 2.0 + (i % 5) as f64 / 3.0).collect();
        let forecast = vec![3.67; 16];
        let body = format_kindex(&observed, &forecast);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 72);
        for line in lines {
            let (_, frac) = line.split_once('.').expect("two-decimal value");
            assert_eq!(frac.len(), 2);
            line.parse::<f64>().unwrap();
        }
    }
}
