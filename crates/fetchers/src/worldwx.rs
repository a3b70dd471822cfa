//! Global weather-grid worker.
//!
//! A fixed grid (latitude -90..90 step 4, longitude -180..180 step 5,
//! 3358 points ordered longitude-major) is refreshed incrementally: a
//! persisted cursor selects the next batch of 50 points each cycle. The
//! artifact is always regenerated in full from the point cache so readers
//! see a complete grid from the first tick, with zeroed placeholders for
//! points not yet fetched and a blank line at every longitude change.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const LAT_STEP: i32 = 4;
const LNG_STEP: i32 = 5;
const BATCH_SIZE: usize = 50;

const HEADER: &str =
    "#   lat     lng  temp,C     %hum    mps     dir    mmHg    Wx           TZ";

/// One cached grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridPoint {
    pub lat: i32,
    pub lng: i32,
    pub temp: f64,
    pub hum: f64,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub pressure: f64,
    pub condition: String,
    pub tz: i64,
}

impl GridPoint {
    /// Zeroed placeholder for a point the worker has not reached yet.
    pub fn placeholder(lat: i32, lng: i32) -> Self {
        Self {
            lat,
            lng,
            temp: 0.0,
            hum: 50.0,
            wind_speed: 0.0,
            wind_dir: 0.0,
            pressure: 1013.0,
            condition: "Clear".into(),
            tz: ((lng as f64 / 15.0).round() as i64) * 3600,
        }
    }
}

pub type PointCache = HashMap<String, GridPoint>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Cursor {
    next_idx: usize,
}

/// The full coordinate enumeration, longitude-major.
pub fn grid_coords() -> Vec<(i32, i32)> {
    let mut coords = Vec::new();
    let mut lng = -180;
    while lng <= 180 {
        let mut lat = -90;
        while lat <= 90 {
            coords.push((lat, lng));
            lat += LAT_STEP;
        }
        lng += LNG_STEP;
    }
    coords
}

pub fn cache_key(lat: i32, lng: i32) -> String {
    format!("{lat},{lng}")
}

/// Condensed condition labels the grid format uses.
pub fn grid_condition(code: i64) -> &'static str {
    match code {
        0 | 1 => "Clear",
        2 | 3 | 45 | 48 => "Clouds",
        51 | 53 | 55 | 56 | 57 | 61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 | 95 | 96 | 99 => "Rain",
        71 | 73 | 75 | 77 | 85 | 86 => "Snow",
        _ => "Clear",
    }
}

/// Render the complete artifact from the cache: header, one fixed-width
/// row per coordinate, blank line between longitude columns.
pub fn render_grid(cache: &PointCache) -> String {
    let mut lines = vec![HEADER.to_string()];
    let mut current_lng = -180;

    for (lat, lng) in grid_coords() {
        if lng != current_lng {
            lines.push(String::new());
            current_lng = lng;
        }
        let point = cache
            .get(&cache_key(lat, lng))
            .cloned()
            .unwrap_or_else(|| GridPoint::placeholder(lat, lng));
        lines.push(format!(
            "{:>7} {:>7} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:<12} {:>7}",
            point.lat,
            point.lng,
            point.temp,
            point.hum,
            point.wind_speed,
            point.wind_dir,
            point.pressure,
            point.condition,
            point.tz
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parse one Open-Meteo result object into a grid point.
fn parse_point(result: &Value, lat: i32, lng: i32) -> GridPoint {
    let current = &result["current"];
    let num = |key: &str, default: f64| current[key].as_f64().unwrap_or(default);
    GridPoint {
        lat,
        lng,
        temp: num("temperature_2m", 0.0),
        hum: num("relative_humidity_2m", 50.0),
        // km/h to m/s
        wind_speed: num("wind_speed_10m", 0.0) / 3.6,
        wind_dir: num("wind_direction_10m", 0.0),
        pressure: num("pressure_msl", 1013.0),
        condition: grid_condition(current["weather_code"].as_i64().unwrap_or(0)).to_string(),
        tz: result["utc_offset_seconds"]
            .as_i64()
            .unwrap_or(((lng as f64 / 15.0).round() as i64) * 3600),
    }
}

/// Fetch one coordinate batch. A 429 maps to `FetchError::HttpStatus(429)`
/// which the caller treats as "stop for this cycle".
async fn fetch_batch(client: &Client, coords: &[(i32, i32)]) -> FetchResult<Vec<GridPoint>> {
    let lats: Vec<String> = coords.iter().map(|c| c.0.to_string()).collect();
    let lngs: Vec<String> = coords.iter().map(|c| c.1.to_string()).collect();
    let url = format!(
        "{OPEN_METEO_URL}?latitude={}&longitude={}\
         &current=temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m,pressure_msl,weather_code\
         &timezone=auto",
        lats.join(","),
        lngs.join(",")
    );

    let resp = client
        .get(&url)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(crate::client::map_reqwest)?;
    if !resp.status().is_success() {
        return Err(FetchError::HttpStatus(resp.status().as_u16()));
    }
    let body: Value = resp
        .json()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    // A single-coordinate request answers with a bare object.
    let results: Vec<Value> = match body {
        Value::Array(list) => list,
        obj => vec![obj],
    };

    Ok(results
        .iter()
        .zip(coords)
        .map(|(res, &(lat, lng))| parse_point(res, lat, lng))
        .collect())
}

fn load_cache(layout: &ArtifactLayout) -> PointCache {
    fs::read_to_string(layout.worldwx_cache())
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn load_cursor(layout: &ArtifactLayout) -> usize {
    fs::read_to_string(layout.worldwx_cursor())
        .ok()
        .and_then(|text| serde_json::from_str::<Cursor>(&text).ok())
        .map(|c| c.next_idx)
        .unwrap_or(0)
}

/// One incremental refresh cycle.
pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let coords = grid_coords();
    let mut cache = load_cache(layout);
    let start = {
        let idx = load_cursor(layout);
        if idx >= coords.len() {
            0
        } else {
            idx
        }
    };
    let end = (start + BATCH_SIZE).min(coords.len());

    info!(start, end, total = coords.len(), "refreshing weather grid subset");

    let mut next_idx = start;
    match fetch_batch(client, &coords[start..end]).await {
        Ok(points) => {
            for p in points {
                cache.insert(cache_key(p.lat, p.lng), p);
            }
            next_idx = if end >= coords.len() { 0 } else { end };
        }
        Err(e) if e.is_rate_limited() => {
            // Resume from the same cursor next cycle.
            warn!("weather API rate limit, aborting this cycle's batch");
        }
        Err(e) => return Err(e),
    }

    let cache_json =
        serde_json::to_string(&cache).map_err(|e| FetchError::Parse(e.to_string()))?;
    fsio::write_atomic(&layout.worldwx_cache(), cache_json.as_bytes())?;
    let cursor_json = serde_json::to_string(&Cursor { next_idx })
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    fsio::write_atomic(&layout.worldwx_cursor(), cursor_json.as_bytes())?;

    // Readers always get a complete grid, fetched or not.
    fsio::write_atomic(&layout.worldwx(), render_grid(&cache).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_3358_points_longitude_major() {
        let coords = grid_coords();
        assert_eq!(coords.len(), 46 * 73);
        assert_eq!(coords[0], (-90, -180));
        assert_eq!(coords[1], (-86, -180));
        assert_eq!(coords[46], (-90, -175));
        assert_eq!(*coords.last().unwrap(), (90, 180));
    }

    #[test]
    fn empty_cache_renders_complete_grid_with_breaks() {
        let body = render_grid(&PointCache::new());
        let lines: Vec<&str> = body.lines().collect();

        let data_rows = lines.iter().filter(|l| !l.is_empty() && !l.starts_with('#')).count();
        assert_eq!(data_rows, 3358);

        // one blank separator per longitude change
        let blanks = lines.iter().filter(|l| l.is_empty()).count();
        assert_eq!(blanks, 72);

        // header first, then the south-west corner row
        assert!(lines[0].starts_with('#'));
        assert!(lines[1].starts_with("    -90    -180"));
    }

    #[test]
    fn placeholder_timezone_follows_longitude() {
        let p = GridPoint::placeholder(0, -75);
        assert_eq!(p.tz, -5 * 3600);
        let p = GridPoint::placeholder(0, 180);
        assert_eq!(p.tz, 12 * 3600);
    }

    #[test]
    fn cached_point_row_is_fixed_width() {
        let mut cache = PointCache::new();
        cache.insert(
            cache_key(42, -80),
            GridPoint {
                lat: 42,
                lng: -80,
                temp: -3.4,
                hum: 71.0,
                wind_speed: 5.0,
                wind_dir: 278.0,
                pressure: 1017.2,
                condition: "Snow".into(),
                tz: -18000,
            },
        );
        let body = render_grid(&cache);
        let row = body
            .lines()
            .find(|l| l.contains("Snow"))
            .expect("cached row present");
        assert_eq!(row, "     42     -80    -3.4    71.0     5.0   278.0  1017.2 Snow          -18000");
    }
}
