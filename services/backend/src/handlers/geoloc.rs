//! IP geolocation endpoint.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::Response;

use super::{text_response, AppError};
use crate::state::SharedState;

pub async fn handle(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    let ip = params.get("ip").map(String::as_str);
    let body = fetchers::geoip::lookup(&state.client, ip).await?;
    Ok(text_response(body))
}
