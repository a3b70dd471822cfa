//! Static artifact serving.
//!
//! Everything the scheduler writes is served verbatim from the artifact
//! tree; only the feed subdirectories named by the client surface (plus
//! bare bitmap/text files at the root) are reachable.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use tracing::debug;

use super::LEGACY_PREFIX;
use crate::state::SharedState;

/// Feed subdirectories on the client surface.
const STATIC_DIRS: [&str; 15] = [
    "geomag",
    "ssn",
    "solar-flux",
    "xray",
    "solar-wind",
    "Bz",
    "aurora",
    "dst",
    "NOAASpaceWX",
    "drap",
    "cty",
    "ONTA",
    "dxpeds",
    "contests",
    "worldwx",
];

/// Is this request path part of the static surface?
pub fn is_static_path(path: &str) -> bool {
    let rel = path.trim_start_matches('/');
    if let Some((first, _)) = rel.split_once('/') {
        return STATIC_DIRS.contains(&first);
    }
    // root-level rendered maps such as map-D-DRAP.bmp.z
    rel.ends_with(".txt") || rel.ends_with(".bmp") || rel.ends_with(".bmp.z")
}

/// Fallback handler covering the whole static family.
pub async fn handle(State(state): State<SharedState>, uri: Uri) -> Response<Body> {
    let path = uri.path();
    let path = path.strip_prefix(LEGACY_PREFIX).unwrap_or(path);

    if !is_static_path(path) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    let Some(file) = state.layout.static_file(path) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match tokio::fs::read(&file).await {
        Ok(content) => {
            debug!(path = %file.display(), bytes = content.len(), "served artifact");
            let content_type = if path.ends_with(".z") || path.ends_with(".bmp") {
                "application/octet-stream"
            } else {
                "text/plain"
            };
            Response::builder()
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, content.len())
                .body(Body::from(content))
                .expect("static response")
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// `/fetchDRAP.pl`: the accumulated absorption stats history.
pub async fn handle_drap_stats(State(state): State<SharedState>) -> Response<Body> {
    let body = tokio::fs::read_to_string(state.layout.drap_stats())
        .await
        .unwrap_or_default();
    super::text_response(body)
}
