//! Single-point weather proxy.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::Response;
use hamclock_common::BackendError;

use super::{text_response, AppError};
use crate::state::SharedState;

pub async fn handle(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    let lat: f64 = params
        .get("lat")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| BackendError::MissingParameter("lat".to_string()))?;
    let lng: f64 = params
        .get("lng")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| BackendError::MissingParameter("lng".to_string()))?;

    let body = fetchers::wx::fetch_weather(&state.client, lat, lng).await?;
    Ok(text_response(body))
}
