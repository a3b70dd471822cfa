//! IP geolocation proxy.

use std::time::Duration;

use hamclock_common::{FetchError, FetchResult};
use reqwest::Client;
use serde::Deserialize;

use crate::client::get_json;

const GEO_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Deserialize)]
pub struct GeoResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub query: String,
}

/// Render the client's key=value block.
pub fn format_geoloc(geo: &GeoResponse) -> String {
    format!(
        "LAT={}\nLNG={}\nIP={}\nCREDIT=ip-api.com",
        geo.lat, geo.lon, geo.query
    )
}

/// Look up `ip` (or the caller's address when empty).
pub async fn lookup(client: &Client, ip: Option<&str>) -> FetchResult<String> {
    let url = match ip {
        Some(ip) if !ip.is_empty() => format!("{GEO_URL}{ip}"),
        _ => GEO_URL.to_string(),
    };
    let geo: GeoResponse = get_json(client, &url, Duration::from_secs(10)).await?;
    if geo.status != "success" {
        return Err(FetchError::Parse(
            geo.message.unwrap_or_else(|| "geolocation failed".into()),
        ));
    }
    Ok(format_geoloc(&geo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout() {
        let geo = GeoResponse {
            status: "success".into(),
            message: None,
            lat: 43.65,
            lon: -79.38,
            query: "203.0.113.7".into(),
        };
        assert_eq!(
            format_geoloc(&geo),
            "LAT=43.65\nLNG=-79.38\nIP=203.0.113.7\nCREDIT=ip-api.com"
        );
    }
}
