//! Propagation map endpoints.
//!
//! The response body is the primary blob immediately followed by the
//! dimmed blob; the `X-2Z-lengths` header tells the client where to
//! split.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Response};
use chrono::{Datelike, Timelike, Utc};
use hamclock_common::BackendError;
use propagation::{generate_map, MapKind, MapRequest, PathKind, SpaceWeather};
use tracing::debug;

use super::{q_f64, q_i64, AppError};
use crate::state::SharedState;

pub async fn handle_area(
    state: State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    serve_map(state.0, params, MapKind::Reliability).await
}

pub async fn handle_muf(
    state: State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    serve_map(state.0, params, MapKind::Muf).await
}

pub async fn handle_toa(
    state: State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    serve_map(state.0, params, MapKind::TakeOffAngle).await
}

fn parse_request(params: &HashMap<String, String>, kind: MapKind) -> MapRequest {
    let now = Utc::now();
    MapRequest {
        width: q_i64(params, "WIDTH", 660).clamp(2, 4096) as u32,
        height: q_i64(params, "HEIGHT", 330).clamp(2, 4096) as u32,
        tx_lat: q_f64(params, "TXLAT", 0.0),
        tx_lng: q_f64(params, "TXLNG", 0.0),
        mhz: q_f64(params, "MHZ", 14.0),
        toa: q_f64(params, "TOA", 3.0),
        year: q_i64(params, "YEAR", now.year() as i64) as i32,
        month: q_i64(params, "MONTH", now.month() as i64).clamp(1, 12) as u32,
        utc: q_f64(params, "UTC", now.hour() as f64),
        path: PathKind::from_code(q_i64(params, "PATH", 0)),
        kind,
    }
    .normalized()
}

async fn serve_map(
    state: SharedState,
    params: HashMap<String, String>,
    kind: MapKind,
) -> Result<Response<Body>, AppError> {
    let req = parse_request(&params, kind);
    let key = req.fingerprint();

    let blobs = match state.map_cache.get(&key).await {
        Some(blobs) => {
            debug!(key = %key, "map served from cache");
            blobs
        }
        None => {
            let engine = state.engine.clone();
            let layout = state.layout.clone();
            let request = req.clone();
            let blobs = tokio::task::spawn_blocking(move || {
                let wx = SpaceWeather::read(&layout);
                generate_map(&engine, &request, &wx)
            })
            .await
            .map_err(|e| BackendError::Internal(format!("map generation: {e}")))?;
            state.map_cache.insert(key, blobs).await
        }
    };

    let mut body = Vec::with_capacity(blobs.primary.len() + blobs.dimmed.len());
    body.extend_from_slice(&blobs.primary);
    body.extend_from_slice(&blobs.dimmed);

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            "X-2Z-lengths",
            format!("{} {}", blobs.primary.len(), blobs.dimmed.len()),
        )
        .body(Body::from(body))
        .expect("map response"))
}
