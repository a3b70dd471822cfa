//! Solar-wind plasma and interplanetary magnetic field.
//!
//! The two product feeds arrive as irregular time series; both artifacts
//! are resampled onto fixed cadences by nearest-time lookup with
//! placeholder sentinels where no sample lands close enough.

use std::time::Duration;

use chrono::NaiveDateTime;
use hamclock_common::textfmt::trim_fixed;
use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use reqwest::Client;
use tracing::info;

use crate::client::get_json;

const SW_PLASMA_URL: &str =
    "https://services.swpc.noaa.gov/products/solar-wind/plasma-1-day.json";
const SW_MAG_URL: &str = "https://services.swpc.noaa.gov/products/solar-wind/mag-1-day.json";

/// 24 h of 1-minute solar-wind samples.
const WIND_POINTS: i64 = 1440;
const WIND_STEP: i64 = 60;
/// 25 h of 10-minute IMF samples.
const IMF_POINTS: i64 = 150;
const IMF_STEP: i64 = 600;

/// Raw product table: header row followed by string/null cells.
type ProductRows = Vec<Vec<Option<String>>>;

/// Timestamped numeric record.
#[derive(Debug, Clone)]
pub struct Sample {
    pub ts: i64,
    pub values: Vec<Option<f64>>,
}

/// Parse a product table into timestamp-sorted samples, skipping the
/// header row.
pub fn parse_product(rows: &ProductRows) -> Vec<Sample> {
    let mut samples: Vec<Sample> = rows
        .iter()
        .skip(1)
        .filter_map(|row| {
            let tag = row.first()?.as_deref()?;
            let ts = parse_time_tag(tag)?;
            let values = row[1..]
                .iter()
                .map(|cell| cell.as_deref().and_then(|s| s.parse::<f64>().ok()))
                .collect();
            Some(Sample { ts, values })
        })
        .collect();
    samples.sort_by_key(|s| s.ts);
    samples
}

fn parse_time_tag(tag: &str) -> Option<i64> {
    let tag = tag.trim_end_matches('Z');
    let dt = NaiveDateTime::parse_from_str(tag, "%Y-%m-%d %H:%M:%S%.3f")
        .or_else(|_| NaiveDateTime::parse_from_str(tag, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    Some(dt.and_utc().timestamp())
}

/// Nearest sample to `target` within `max_diff` seconds.
fn nearest<'a>(samples: &'a [Sample], target: i64, max_diff: i64) -> Option<&'a Sample> {
    if samples.is_empty() {
        return None;
    }
    let idx = samples.partition_point(|s| s.ts < target);
    let mut best: Option<&Sample> = None;
    for candidate in [idx.checked_sub(1).and_then(|i| samples.get(i)), samples.get(idx)]
        .into_iter()
        .flatten()
    {
        let diff = (candidate.ts - target).abs();
        if diff <= max_diff && best.map_or(true, |b| diff < (b.ts - target).abs()) {
            best = Some(candidate);
        }
    }
    best
}

/// Build the 1440-line solar-wind artifact body ending at `now_ts`
/// (already aligned to a 60 s boundary).
pub fn format_wind(samples: &[Sample], now_ts: i64) -> String {
    let mut out = String::new();
    for i in 0..WIND_POINTS {
        let target = now_ts - (WIND_POINTS - 1 - i) * WIND_STEP;
        let line = match nearest(samples, target, WIND_STEP / 2) {
            Some(s) => match (s.values.first().copied().flatten(), s.values.get(1).copied().flatten())
            {
                (Some(density), Some(speed)) => {
                    format!("{target} {} {}", trim_fixed(density, 2), trim_fixed(speed, 1))
                }
                _ => format!("{target} 0.00 0.0"),
            },
            None => format!("{target} 0.00 0.0"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Build the 150-line IMF artifact body (comment header + rows).
pub fn format_imf(samples: &[Sample], now_ts: i64) -> String {
    let mut out = String::from("# UNIX        Bx     By     Bz     Bt\n");
    for i in 0..IMF_POINTS {
        let target = now_ts - (IMF_POINTS - 1 - i) * IMF_STEP;
        let fields = nearest(samples, target, IMF_STEP / 2).and_then(|s| {
            let bx = s.values.first().copied().flatten()?;
            let by = s.values.get(1).copied().flatten()?;
            let bz = s.values.get(2).copied().flatten()?;
            let bt = s.values.get(5).copied().flatten()?;
            Some((bx, by, bz, bt))
        });
        let line = match fields {
            Some((bx, by, bz, bt)) => {
                format!("{target}   {bx:>4.1}   {by:>4.1}   {bz:>4.1}    {bt:>4.1}")
            }
            None => format!("{target}    0.0   0.0   0.0    0.0"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let plasma: ProductRows = get_json(client, SW_PLASMA_URL, Duration::from_secs(10)).await?;
    let mag: ProductRows = get_json(client, SW_MAG_URL, Duration::from_secs(10)).await?;

    let plasma = parse_product(&plasma);
    let mag = parse_product(&mag);

    let now_ts = chrono::Utc::now().timestamp() / 60 * 60;
    fsio::write_atomic(&layout.solar_wind(), format_wind(&plasma, now_ts).as_bytes())?;
    fsio::write_atomic(&layout.bz(), format_imf(&mag, now_ts).as_bytes())?;

    info!(plasma = plasma.len(), mag = mag.len(), "solar wind and IMF updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(entries: &[(&str, &[&str])]) -> ProductRows {
        let mut out: ProductRows = vec![vec![Some("time_tag".to_string())]];
        for (tag, vals) in entries {
            let mut row = vec![Some(tag.to_string())];
            row.extend(vals.iter().map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            }));
            out.push(row);
        }
        out
    }

    #[test]
    fn wind_always_emits_1440_lines() {
        let product = rows(&[("2026-02-02 23:25:00.000", &["3.25", "418.60", "70000"])]);
        let samples = parse_product(&product);
        let now = samples[0].ts + 120;
        let body = format_wind(&samples, now);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 1440);
        // The matching minute carries the sample, trailing zeros stripped.
        assert!(lines.iter().any(|l| l.ends_with("3.25 418.6")));
        // Everything else is the placeholder sentinel.
        assert!(lines[0].ends_with("0.00 0.0"));
    }

    #[test]
    fn imf_gaps_become_zero_rows() {
        let product = rows(&[(
            "2026-02-02 23:20:00.000",
            &["0.1", "-0.4", "-2.3", "120.0", "10.0", "2.4"],
        )]);
        let samples = parse_product(&product);
        let now = samples[0].ts;
        let body = format_imf(&samples, now);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 1 + 150);
        assert!(lines[0].starts_with('#'));
        assert!(lines[150].contains("-2.3"));
        assert!(lines[1].ends_with("0.0   0.0   0.0    0.0"));
    }

    #[test]
    fn nearest_respects_window() {
        let product = rows(&[("2026-02-02 23:20:00.000", &["1.0", "2.0"])]);
        let samples = parse_product(&product);
        let ts = samples[0].ts;
        assert!(nearest(&samples, ts + 30, 30).is_some());
        assert!(nearest(&samples, ts + 31, 30).is_none());
    }
}
