//! Development-only diagnostic page: artifact freshness at a glance.
//!
//! The URL is not part of the client contract.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Response};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::state::SharedState;

pub async fn handle(State(state): State<SharedState>) -> Response<Body> {
    let layout = &state.layout;
    let artifacts: [(&str, PathBuf); 14] = [
        ("sunspots", layout.ssn()),
        ("solar flux", layout.solar_flux()),
        ("planetary K", layout.kindex()),
        ("x-ray", layout.xray()),
        ("solar wind", layout.solar_wind()),
        ("IMF", layout.bz()),
        ("scales", layout.noaa_scales()),
        ("aurora", layout.aurora()),
        ("Dst", layout.dst()),
        ("country/prefix", layout.cty()),
        ("activations", layout.onta()),
        ("dxpeditions", layout.dxpeds()),
        ("contests", layout.contests()),
        ("world weather", layout.worldwx()),
    ];

    let mut rows = String::new();
    for (name, path) in &artifacts {
        let (size, age) = match std::fs::metadata(path) {
            Ok(meta) => {
                let age = meta
                    .modified()
                    .ok()
                    .and_then(|m| SystemTime::now().duration_since(m).ok())
                    .map(|d| format!("{}s", d.as_secs()))
                    .unwrap_or_else(|| "?".to_string());
                (meta.len().to_string(), age)
            }
            Err(_) => ("missing".to_string(), "-".to_string()),
        };
        rows.push_str(&format!(
            "<tr><td>{name}</td><td>{}</td><td>{size}</td><td>{age}</td></tr>\n",
            path.display()
        ));
    }

    let html = format!(
        "<!DOCTYPE html><html><head><title>artifact status</title></head><body>\
         <h1>Artifact status</h1>\
         <table border=\"1\"><tr><th>feed</th><th>path</th><th>bytes</th><th>age</th></tr>\n\
         {rows}</table></body></html>"
    );

    Response::builder()
        .header(header::CONTENT_TYPE, "text/html")
        .body(Body::from(html))
        .expect("static response")
}
