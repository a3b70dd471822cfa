//! Single-point weather proxy for `/wx.pl`.
//!
//! Open-Meteo answers with an IANA zone name and a UTC offset alongside
//! the current conditions; the zone name is resolved locally (DST-aware)
//! with the API offset and a longitude estimate as fallbacks.

use std::str::FromStr;
use std::time::Duration;

use chrono::{Offset, TimeZone, Utc};
use chrono_tz::Tz;
use hamclock_common::FetchResult;
use reqwest::Client;
use serde::Deserialize;

use crate::client::get_json;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
pub struct WxResponse {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub utc_offset_seconds: Option<i64>,
    pub current: WxCurrent,
}

#[derive(Debug, Default, Deserialize)]
pub struct WxCurrent {
    #[serde(default)]
    pub temperature_2m: f64,
    #[serde(default)]
    pub relative_humidity_2m: f64,
    /// km/h as delivered by the API.
    #[serde(default)]
    pub wind_speed_10m: f64,
    #[serde(default)]
    pub wind_direction_10m: f64,
    #[serde(default)]
    pub pressure_msl: f64,
    #[serde(default)]
    pub weather_code: i64,
}

/// 16-point compass rose name for a bearing in degrees.
pub fn wind_dir_name(deg: f64) -> &'static str {
    const DIRS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = (((deg + 11.25) / 22.5) as usize) % 16;
    DIRS[idx]
}

/// Deterministic WMO weather-code to condition-label mapping.
pub fn condition_label(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 | 56 | 57 => "Drizzle",
        61 | 63 | 65 | 66 | 67 => "Rain",
        71 | 73 | 75 | 77 => "Snow",
        80 | 81 | 82 => "Rain Showers",
        85 | 86 => "Snow",
        95 | 96 | 99 => "Thunderstorm",
        _ => "Clear",
    }
}

/// Resolve the UTC offset in seconds: IANA zone first, then the API's
/// own offset, then a longitude estimate.
pub fn resolve_timezone(zone: Option<&str>, api_offset: Option<i64>, lng: f64) -> i64 {
    if let Some(name) = zone {
        if let Ok(tz) = Tz::from_str(name) {
            let offset = tz
                .offset_from_utc_datetime(&Utc::now().naive_utc())
                .fix()
                .local_minus_utc();
            return offset as i64;
        }
    }
    if let Some(offset) = api_offset {
        return offset;
    }
    ((lng / 15.0).round() as i64) * 3600
}

/// Render the client's key=value block.
pub fn format_report(wx: &WxResponse, lat: f64, lng: f64) -> String {
    let c = &wx.current;
    let condition = condition_label(c.weather_code);
    let timezone = resolve_timezone(wx.timezone.as_deref(), wx.utc_offset_seconds, lng);
    let lines = [
        format!("city={lat:.2},{lng:.2}"),
        format!("temperature_c={:.2}", c.temperature_2m),
        format!("pressure_hPa={:.2}", c.pressure_msl),
        "pressure_chg=0.00".to_string(),
        format!("humidity_percent={:.2}", c.relative_humidity_2m),
        format!("wind_speed_mps={:.2}", c.wind_speed_10m / 3.6),
        format!("wind_dir_name={}", wind_dir_name(c.wind_direction_10m)),
        format!("clouds={condition}"),
        format!("conditions={condition}"),
        "attribution=open-meteo.com".to_string(),
        format!("timezone={timezone}"),
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Fetch and format current weather for a point.
pub async fn fetch_weather(client: &Client, lat: f64, lng: f64) -> FetchResult<String> {
    let url = format!(
        "{OPEN_METEO_URL}?latitude={lat}&longitude={lng}\
         &current=temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m,pressure_msl,weather_code\
         &timezone=auto"
    );
    let wx: WxResponse = get_json(client, &url, Duration::from_secs(10)).await?;
    Ok(format_report(&wx, lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WxResponse {
        WxResponse {
            timezone: None,
            utc_offset_seconds: Some(-18000),
            current: WxCurrent {
                temperature_2m: -3.4,
                relative_humidity_2m: 71.0,
                wind_speed_10m: 18.0,
                wind_direction_10m: 278.0,
                pressure_msl: 1017.2,
                weather_code: 73,
            },
        }
    }

    #[test]
    fn block_has_all_canonical_keys() {
        let body = format_report(&sample(), 45.0, -75.0);
        for key in [
            "city=",
            "temperature_c=",
            "pressure_hPa=",
            "pressure_chg=",
            "humidity_percent=",
            "wind_speed_mps=",
            "wind_dir_name=",
            "clouds=",
            "conditions=",
            "attribution=",
            "timezone=",
        ] {
            assert!(body.contains(key), "missing {key}");
        }
        assert!(body.contains("temperature_c=-3.40"));
        assert!(body.contains("wind_speed_mps=5.00"));
        assert!(body.contains("conditions=Snow"));
        assert!(body.contains("timezone=-18000"));
    }

    #[test]
    fn wind_rose() {
        assert_eq!(wind_dir_name(0.0), "N");
        assert_eq!(wind_dir_name(95.0), "E");
        assert_eq!(wind_dir_name(278.0), "W");
        assert_eq!(wind_dir_name(359.0), "N");
    }

    #[test]
    fn timezone_fallback_chain() {
        assert_eq!(resolve_timezone(Some("Etc/UTC"), Some(1234), 100.0), 0);
        assert_eq!(resolve_timezone(Some("not-a-zone"), Some(1234), 100.0), 1234);
        assert_eq!(resolve_timezone(None, None, -75.0), -5 * 3600);
    }
}
