//! Band-conditions table.
//!
//! Line 1: current reliabilities for the nine canonical bands.
//! Line 2: parameter summary `POWERw,MODE,TOA>n,SP|LP,S=ssn`.
//! Lines 3..26: hourly forecasts for hours 1..23 then 0.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::Response;
use chrono::{Datelike, Timelike, Utc};
use propagation::{evaluate_point, Mode, PathKind, SpaceWeather};

use super::{q_f64, q_i64, text_response, AppError};
use crate::state::SharedState;

/// Canonical band list, MHz, low to high.
pub const BANDS: [f64; 9] = [3.5, 7.0, 10.1, 14.0, 18.1, 21.0, 24.9, 28.0, 50.0];

/// Typed endpoint parameters.
#[derive(Debug, Clone)]
pub struct BandParams {
    pub tx_lat: f64,
    pub tx_lng: f64,
    pub rx_lat: f64,
    pub rx_lng: f64,
    pub mode: Mode,
    /// Raw power figure, echoed into the summary line.
    pub power: String,
    pub path: PathKind,
    pub toa: f64,
    /// Raw TOA text, echoed into the summary line.
    pub toa_label: String,
    pub utc: f64,
}

impl BandParams {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let toa_label = params.get("TOA").cloned().unwrap_or_else(|| "3".into());
        Self {
            tx_lat: q_f64(params, "TXLAT", 0.0),
            tx_lng: q_f64(params, "TXLNG", 0.0),
            rx_lat: q_f64(params, "RXLAT", 0.0),
            rx_lng: q_f64(params, "RXLNG", 0.0),
            mode: Mode::from_code(q_i64(params, "MODE", 1)).unwrap_or(Mode::Cw),
            power: params.get("POW").cloned().unwrap_or_else(|| "100".into()),
            path: PathKind::from_code(q_i64(params, "PATH", 0)),
            toa: q_f64(params, "TOA", 3.0),
            toa_label,
            utc: q_f64(params, "UTC", Utc::now().hour() as f64),
        }
    }
}

/// Build the 26-line table.
pub fn build_table(p: &BandParams, month: u32, wx: &SpaceWeather) -> String {
    let rels_for = |utc: f64| -> String {
        let rels: Vec<String> = BANDS
            .iter()
            .map(|&mhz| {
                let (_muf, rel) = evaluate_point(
                    p.tx_lat, p.tx_lng, p.rx_lat, p.rx_lng, mhz, p.toa, month, utc, p.path, wx,
                );
                format!("{rel:.2}")
            })
            .collect();
        rels.join(",")
    };

    let mut lines = Vec::with_capacity(26);
    lines.push(rels_for(p.utc));
    lines.push(format!(
        "{}W,{},TOA>{},{},S={}",
        p.power,
        p.mode.label(),
        p.toa_label,
        p.path.label(),
        wx.ssn as i64
    ));
    for h in 1..24 {
        lines.push(format!("{h} {}", rels_for(h as f64)));
    }
    lines.push(format!("0 {}", rels_for(0.0)));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub async fn handle(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    let band_params = BandParams::from_query(&params);
    let layout = state.layout.clone();
    let month = Utc::now().month();
    let body = tokio::task::spawn_blocking(move || {
        let wx = SpaceWeather::read(&layout);
        build_table(&band_params, month, &wx)
    })
    .await
    .map_err(|e| hamclock_common::BackendError::Internal(e.to_string()))?;
    Ok(text_response(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BandParams {
        let mut query = HashMap::new();
        for (k, v) in [
            ("TXLAT", "45"),
            ("TXLNG", "-75"),
            ("RXLAT", "51"),
            ("RXLNG", "0"),
            ("MODE", "38"),
            ("POW", "50"),
            ("PATH", "1"),
            ("TOA", "3"),
            ("UTC", "14"),
        ] {
            query.insert(k.to_string(), v.to_string());
        }
        BandParams::from_query(&query)
    }

    #[test]
    fn table_shape_and_summary() {
        let wx = SpaceWeather { ssn: 131.0, kp: 0.0, bz: 0.0, wind_speed: 400.0 };
        let table = build_table(&params(), 2, &wx);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 26);
        assert_eq!(lines[1], "50W,SSB,TOA>3,LP,S=131");

        // hourly rows run 1..23 then wrap to 0
        for (i, h) in (1..24).enumerate() {
            assert!(lines[2 + i].starts_with(&format!("{h} ")), "line {}", 2 + i);
        }
        assert!(lines[25].starts_with("0 "));

        // every row carries nine two-decimal reliabilities
        for line in [lines[0], lines[2], lines[25]] {
            let rels = line.trim_start_matches(|c: char| c.is_ascii_digit() || c == ' ');
            assert_eq!(rels.split(',').count(), 9);
        }
    }

    #[test]
    fn reliabilities_are_probabilities() {
        let wx = SpaceWeather { ssn: 131.0, kp: 0.0, bz: 0.0, wind_speed: 400.0 };
        let table = build_table(&params(), 2, &wx);
        for field in table.lines().next().unwrap().split(',') {
            let v: f64 = field.parse().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
