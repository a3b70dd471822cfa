//! D-region absorption predictions.
//!
//! The upstream text grid (roughly 37 latitude rows of 90 longitude
//! samples) yields two artifacts: a running `min max mean` stats history
//! and a 660x330 RGB565 map rendered through the MUF colour ramp after
//! bilinear upsampling.

use std::time::Duration;

use chrono::NaiveDateTime;
use codecs::{bmp565_header, zlib_compress, ColorTables};
use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use reqwest::Client;
use tracing::info;

use crate::client::get_text;

const DRAP_URL: &str = "https://services.swpc.noaa.gov/text/drap_global_frequencies.txt";

const MAP_W: usize = 660;
const MAP_H: usize = 330;

/// Parsed absorption grid plus the product timestamp when present.
pub struct DrapGrid {
    pub rows: Vec<Vec<f64>>,
    pub valid_at: Option<i64>,
}

pub fn parse_drap(text: &str) -> DrapGrid {
    let mut rows = Vec::new();
    let mut valid_at = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Product Valid At :") {
            let ts = rest.trim().trim_end_matches(" UTC").trim();
            if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M") {
                valid_at = Some(dt.and_utc().timestamp());
            }
            continue;
        }
        if line.starts_with('#') || line.trim().is_empty() || line.contains("---") {
            continue;
        }
        let Some((_, values)) = line.split_once('|') else { continue };
        let vals: Vec<f64> = values
            .split_whitespace()
            .filter_map(|v| v.parse().ok())
            .collect();
        if !vals.is_empty() {
            rows.push(vals);
        }
    }

    DrapGrid { rows, valid_at }
}

/// Bilinear upsample of a row-major grid.
pub fn resample_bilinear(
    src: &[f64],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(dst_w * dst_h);
    for y in 0..dst_h {
        let fy = if dst_h > 1 {
            y as f64 * (src_h - 1) as f64 / (dst_h - 1) as f64
        } else {
            0.0
        };
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let ty = fy - y0 as f64;
        for x in 0..dst_w {
            let fx = if dst_w > 1 {
                x as f64 * (src_w - 1) as f64 / (dst_w - 1) as f64
            } else {
                0.0
            };
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let tx = fx - x0 as f64;

            let top = src[y0 * src_w + x0] * (1.0 - tx) + src[y0 * src_w + x1] * tx;
            let bottom = src[y1 * src_w + x0] * (1.0 - tx) + src[y1 * src_w + x1] * tx;
            out.push(top * (1.0 - ty) + bottom * ty);
        }
    }
    out
}

/// Render the absorption map through the MUF ramp.
pub fn render_map(grid: &DrapGrid, tables: &ColorTables) -> Option<Vec<u8>> {
    let src_h = grid.rows.len();
    let src_w = grid.rows.first()?.len();
    if src_h < 2 || src_w < 2 {
        return None;
    }
    let mut flat = Vec::with_capacity(src_w * src_h);
    for row in &grid.rows {
        if row.len() != src_w {
            return None;
        }
        flat.extend_from_slice(row);
    }

    let resampled = resample_bilinear(&flat, src_w, src_h, MAP_W, MAP_H);
    let mut out = bmp565_header(MAP_W as u32, MAP_H as u32);
    out.reserve(MAP_W * MAP_H * 2);
    for v in resampled {
        out.extend_from_slice(&tables.muf_color(v).to_le_bytes());
    }
    Some(out)
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let text = get_text(client, DRAP_URL, Duration::from_secs(10)).await?;
    let grid = parse_drap(&text);
    if grid.rows.is_empty() {
        return Err(FetchError::Parse("no absorption grid rows".into()));
    }

    let flat: Vec<f64> = grid.rows.iter().flatten().copied().collect();
    let min = flat.iter().copied().fold(f64::INFINITY, f64::min);
    let max = flat.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = flat.iter().sum::<f64>() / flat.len() as f64;
    let utime = grid.valid_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
    fsio::append_line(
        &layout.drap_stats(),
        &format!("{utime} : {min:.2} {max:.2} {mean:.2}"),
    )?;

    let tables = ColorTables::new();
    if let Some(bitmap) = render_map(&grid, &tables) {
        fsio::write_atomic(&layout.drap_map(), &bitmap)?;
        fsio::write_atomic(&layout.drap_map_z(), &zlib_compress(&bitmap))?;
    }

    info!(min, max, mean, "absorption map updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Product Valid At : 2026-02-01 12:00 UTC\n\
#    some header\n\
---------------------\n\
  75 | 1.0 2.0 3.0\n\
  70 | 2.0 3.0 4.0\n\
  65 | 3.0 4.0 5.0\n";

    #[test]
    fn parses_grid_and_timestamp() {
        let grid = parse_drap(SAMPLE);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[0], vec![1.0, 2.0, 3.0]);
        assert!(grid.valid_at.is_some());
    }

    #[test]
    fn bilinear_preserves_corners() {
        let src = vec![0.0, 10.0, 20.0, 30.0];
        let out = resample_bilinear(&src, 2, 2, 4, 4);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3], 10.0);
        assert_eq!(out[12], 20.0);
        assert_eq!(out[15], 30.0);
    }

    #[test]
    fn rendered_map_has_full_frame() {
        let grid = parse_drap(SAMPLE);
        let bitmap = render_map(&grid, &ColorTables::new()).unwrap();
        assert_eq!(bitmap.len(), 122 + MAP_W * MAP_H * 2);
    }
}
