//! Request routing for the legacy CGI-style surface.

pub mod bands;
pub mod geoloc;
pub mod maps;
pub mod parity;
pub mod sdo;
pub mod spots;
pub mod statics;
pub mod version;
pub mod wx;

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use hamclock_common::BackendError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// The historical hosted-service mount; requests may arrive with or
/// without it.
pub const LEGACY_PREFIX: &str = "/ham/HamClock";

/// Build the full router: every route is reachable bare and under the
/// legacy prefix.
pub fn router(state: SharedState) -> Router {
    let surface = Router::new()
        .route("/fetchIPGeoloc.pl", get(geoloc::handle))
        .route("/fetchPSKReporter.pl", get(spots::handle))
        .route("/fetchVOACAPArea.pl", get(maps::handle_area))
        .route("/fetchVOACAP-MUF.pl", get(maps::handle_muf))
        .route("/fetchVOACAP-TOA.pl", get(maps::handle_toa))
        .route("/fetchBandConditions.pl", get(bands::handle))
        .route("/wx.pl", get(wx::handle))
        .route("/version.pl", get(version::handle))
        .route("/fetchDRAP.pl", get(statics::handle_drap_stats))
        .route("/SDO/*file", get(sdo::handle))
        .route("/parity", get(parity::handle))
        .fallback(statics::handle)
        .with_state(state);

    Router::new()
        .nest(LEGACY_PREFIX, surface.clone())
        .merge(surface)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Per-request failure wrapper: every handler error becomes a short
/// plain-text reason with the matching status code.
pub struct AppError(pub BackendError);

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.0.to_string()).into_response()
    }
}

impl<E: Into<BackendError>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Query helpers: the client sends positional-looking uppercase keys
/// with numeric values; absent keys fall back to defaults.
pub(crate) fn q_f64(params: &HashMap<String, String>, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn q_i64(params: &HashMap<String, String>, key: &str, default: i64) -> i64 {
    params
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Plain-text response helper.
pub(crate) fn text_response(body: String) -> Response<Body> {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body))
        .expect("static response")
}

/// Binary response helper.
pub(crate) fn octet_response(body: Vec<u8>) -> Response<Body> {
    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .expect("static response")
}
