//! Immutable engine context built once at startup.
//!
//! Replaces the historical module-level mutable caches: colour tables,
//! per-pixel coordinate grids, and the preloaded background world map all
//! live here and are shared read-only between request handlers.

use std::fs;
use std::path::Path;

use codecs::ColorTables;
use hamclock_common::ArtifactLayout;
use tracing::{info, warn};

use crate::{MAP_H, MAP_W};

pub struct EngineContext {
    pub tables: ColorTables,
    /// Latitude of each raster row, radians (row 0 = +90).
    pub lat_rad: Vec<f64>,
    /// Longitude of each raster column, radians (col 0 = -180).
    pub lng_rad: Vec<f64>,
    pub sin_lat: Vec<f64>,
    pub cos_lat: Vec<f64>,
    /// RGB565 world map blended under every rendered field.
    pub background: Option<Vec<u16>>,
    /// Non-zero mask entries are forced to black in the output.
    pub mask: Option<Vec<u16>>,
}

impl EngineContext {
    /// Build the context, loading base maps from the artifact tree when
    /// present. Missing maps are logged and rendering proceeds without
    /// blending.
    pub fn load(layout: &ArtifactLayout) -> Self {
        let lat_rad: Vec<f64> = (0..MAP_H)
            .map(|y| (90.0 - y as f64 * 180.0 / MAP_H as f64).to_radians())
            .collect();
        let lng_rad: Vec<f64> = (0..MAP_W)
            .map(|x| (-180.0 + x as f64 * 360.0 / MAP_W as f64).to_radians())
            .collect();
        let sin_lat = lat_rad.iter().map(|v| v.sin()).collect();
        let cos_lat = lat_rad.iter().map(|v| v.cos()).collect();

        let background = load_bmp565(&layout.countries_map())
            .or_else(|| load_bmp565(&layout.terrain_map()));
        if background.is_none() {
            warn!("no background world map found; propagation maps render unblended");
        }
        let mask = load_mask(&layout.countries_mask());

        info!(
            background = background.is_some(),
            mask = mask.is_some(),
            "propagation engine context ready"
        );

        Self {
            tables: ColorTables::new(),
            lat_rad,
            lng_rad,
            sin_lat,
            cos_lat,
            background,
            mask,
        }
    }

    /// Context without any base maps; used by tests.
    pub fn bare() -> Self {
        Self::load(&ArtifactLayout::new("/nonexistent"))
    }
}

/// Read the pixel payload of a 660x330 RGB565 bitmap (122-byte prefix).
fn load_bmp565(path: &Path) -> Option<Vec<u16>> {
    let data = fs::read(path).ok()?;
    let need = 122 + MAP_W * MAP_H * 2;
    if data.len() < need {
        warn!(path = %path.display(), len = data.len(), "base map too short, ignoring");
        return None;
    }
    Some(
        data[122..need]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect(),
    )
}

/// Raw little-endian u16 grid of the same raster shape.
fn load_mask(path: &Path) -> Option<Vec<u16>> {
    let data = fs::read(path).ok()?;
    if data.len() < MAP_W * MAP_H * 2 {
        warn!(path = %path.display(), "countries mask too short, ignoring");
        return None;
    }
    Some(
        data[..MAP_W * MAP_H * 2]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_axes() {
        let ctx = EngineContext::bare();
        assert_eq!(ctx.lat_rad.len(), MAP_H);
        assert_eq!(ctx.lng_rad.len(), MAP_W);
        // row 0 is +90 deg, col 0 is -180 deg
        assert!((ctx.lat_rad[0].to_degrees() - 90.0).abs() < 1e-9);
        assert!((ctx.lng_rad[0].to_degrees() + 180.0).abs() < 1e-9);
        // last column stops one step short of +180
        let last = ctx.lng_rad[MAP_W - 1].to_degrees();
        assert!((last - (180.0 - 360.0 / MAP_W as f64)).abs() < 1e-9);
    }
}
