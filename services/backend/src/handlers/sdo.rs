//! Solar imagery endpoint: `/SDO/<name>.bmp.z`.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::Response;

use super::{octet_response, AppError};
use crate::state::SharedState;

pub async fn handle(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Response<Body>, AppError> {
    let blob = state.sdo_cache.fetch(&state.client, &file).await?;
    Ok(octet_response(blob.as_ref().clone()))
}
