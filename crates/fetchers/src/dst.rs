//! Disturbance storm time index from the Kyoto WDC realtime service.
//!
//! Records are fixed-column: `DST` marker, two-digit year/month at
//! offsets 3 and 5, day at 8, century at 14, then 24 four-character
//! hourly cells starting at column 20. `9999` marks a missing hour.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use reqwest::Client;
use tracing::{info, warn};

use crate::client::get_text;

const KYOTO_DST_BASE_URL: &str = "http://wdc.kugi.kyoto-u.ac.jp/dst_realtime";

const DST_WINDOW: usize = 24;
const MISSING: &str = "9999";

/// Parse the fixed-column records into (timestamp, value) pairs.
pub fn parse_dst(text: &str) -> Vec<(NaiveDateTime, i32)> {
    let mut values = Vec::new();
    for line in text.lines() {
        if !line.starts_with("DST") {
            continue;
        }
        let field = |range: std::ops::Range<usize>| -> Option<i32> {
            line.get(range)?.trim().parse().ok()
        };
        let (Some(year_short), Some(month), Some(day), Some(century)) =
            (field(3..5), field(5..7), field(8..10), field(14..16))
        else {
            continue;
        };
        let year = century * 100 + year_short;

        let Some(hourly) = line.get(20..116) else { continue };
        for h in 0..DST_WINDOW {
            let cell = hourly[h * 4..(h + 1) * 4].trim();
            if cell.is_empty() || cell == MISSING {
                continue;
            }
            let Ok(v) = cell.parse::<i32>() else { continue };
            if let Some(ts) = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
                .and_then(|d| d.and_hms_opt(h as u32, 0, 0))
            {
                values.push((ts, v));
            }
        }
    }
    values.sort_by_key(|(ts, _)| *ts);
    values
}

/// Render the 24 most-recent hourly rows.
pub fn format_dst(values: &[(NaiveDateTime, i32)]) -> String {
    let start = values.len().saturating_sub(DST_WINDOW);
    let mut out = String::new();
    for (ts, v) in &values[start..] {
        out.push_str(&format!("{} {v}\n", ts.format("%Y-%m-%dT%H:%M:%S")));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let now = Utc::now();
    let yymm = now.format("%y%m");
    let yyyymm = now.format("%Y%m");

    let url = format!("{KYOTO_DST_BASE_URL}/presentmonth/dst{yymm}.for.request");
    let text = match get_text(client, &url, Duration::from_secs(15)).await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "present-month Dst fetch failed, trying month directory");
            let url = format!("{KYOTO_DST_BASE_URL}/{yyyymm}/dst{yymm}.for.request");
            match get_text(client, &url, Duration::from_secs(15)).await {
                Ok(t) => t,
                Err(e) => {
                    // Keep the client alive on first run: a zeroed day is
                    // better than a missing artifact.
                    if !layout.dst().exists() {
                        fsio::write_atomic(&layout.dst(), placeholder_day(now).as_bytes())?;
                        warn!("wrote placeholder Dst series");
                        return Ok(());
                    }
                    return Err(e);
                }
            }
        }
    };

    let values = parse_dst(&text);
    if values.is_empty() {
        return Err(FetchError::Parse("no Dst records parsed".into()));
    }
    fsio::write_atomic(&layout.dst(), format_dst(&values).as_bytes())?;

    info!(rows = values.len().min(DST_WINDOW), "Dst series updated");
    Ok(())
}

fn placeholder_day(now: chrono::DateTime<Utc>) -> String {
    let top = Utc
        .timestamp_opt(now.timestamp() / 3600 * 3600, 0)
        .single()
        .unwrap_or(now);
    let mut out = String::new();
    for h in (0..DST_WINDOW as i64).rev() {
        let ts = top - chrono::Duration::hours(h);
        out.push_str(&format!("{} 0\n", ts.format("%Y-%m-%dT%H:%M:%S")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn record(values: &[&str]) -> String {
        // DSTyymm*dd RR X20 (century at 14..16) then 24 4-char cells
        let mut line = String::from("DST2602*01RRX 20      ");
        line.truncate(20);
        while line.len() < 20 {
            line.push(' ');
        }
        for v in values {
            line.push_str(&format!("{v:>4}"));
        }
        line
    }

    #[test]
    fn parses_fixed_columns_and_skips_missing() {
        let mut cells: Vec<&str> = vec!["-12", "-15", "9999", "-20"];
        cells.resize(24, "9999");
        let text = record(&cells);
        let values = parse_dst(&text);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].1, -12);
        assert_eq!(values[0].0.format("%Y-%m-%dT%H:%M:%S").to_string(), "2026-02-01T00:00:00");
        assert_eq!(values[2].1, -20);
        assert_eq!(values[2].0.hour(), 3);
    }

    #[test]
    fn output_keeps_most_recent_24() {
        let mut cells: Vec<&str> = Vec::new();
        cells.resize(24, "-10");
        let two_days = format!("{}\n{}", record(&cells), record(&cells));
        // identical day rows parse into 48 values; output clamps to 24
        let values = parse_dst(&two_days);
        let body = format_dst(&values);
        assert_eq!(body.lines().count(), 24);
        assert!(body.lines().all(|l| l.ends_with(" -10")));
    }
}
