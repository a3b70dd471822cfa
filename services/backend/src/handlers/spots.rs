//! PSKReporter spot proxy.
//!
//! `bycall`/`bygrid` ask for spots heard from the station (DE = sender);
//! `ofcall`/`ofgrid` ask for spots of the station as heard by others
//! (DE = receiver).

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::Response;
use fetchers::spots::{fetch_spots, SpotQuery, SpotTarget};
use hamclock_common::BackendError;

use super::{text_response, AppError};
use crate::state::SharedState;

pub fn parse_query(params: &HashMap<String, String>) -> Option<SpotQuery> {
    let maxage_sec = params
        .get("maxage")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1800);

    let (target, is_receiver) = if let Some(call) = params.get("bycall") {
        (SpotTarget::Callsign(call.clone()), false)
    } else if let Some(grid) = params.get("bygrid") {
        (SpotTarget::Grid(grid.clone()), false)
    } else if let Some(call) = params.get("ofcall") {
        (SpotTarget::Callsign(call.clone()), true)
    } else if let Some(grid) = params.get("ofgrid") {
        (SpotTarget::Grid(grid.clone()), true)
    } else {
        return None;
    };

    Some(SpotQuery { target, is_receiver, maxage_sec })
}

pub async fn handle(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response<Body>, AppError> {
    let query = parse_query(&params).ok_or_else(|| {
        BackendError::MissingParameter("bycall|ofcall|bygrid|ofgrid".to_string())
    })?;
    let csv = fetch_spots(&state.client, &query).await?;
    Ok(text_response(csv))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(key: &str, value: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert(key.to_string(), value.to_string());
        params.insert("maxage".to_string(), "900".to_string());
        params
    }

    #[test]
    fn orientation_follows_query_family() {
        let q = parse_query(&query("bycall", "W1AW")).unwrap();
        assert!(!q.is_receiver);
        assert_eq!(q.maxage_sec, 900);

        let q = parse_query(&query("ofcall", "W1AW")).unwrap();
        assert!(q.is_receiver);

        let q = parse_query(&query("ofgrid", "FN31")).unwrap();
        assert!(q.is_receiver);
        assert!(matches!(q.target, SpotTarget::Grid(_)));
    }

    #[test]
    fn missing_target_is_rejected() {
        assert!(parse_query(&HashMap::new()).is_none());
    }
}
