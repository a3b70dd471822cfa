//! Full-grid evaluation and post-processing.

use rayon::prelude::*;

use hamclock_common::geo::cos_solar_zenith;

use crate::cache::MapBlobs;
use crate::context::EngineContext;
use crate::model::{evaluate_path, PathInputs, TxSite};
use crate::render::render_pair;
use crate::request::{MapKind, MapRequest, PathKind};
use crate::spacewx::SpaceWeather;
use crate::{MAP_H, MAP_W};

/// Raw per-pixel engine outputs before post-processing.
pub struct ScalarField {
    pub muf: Vec<f64>,
    pub rel: Vec<f64>,
    pub dist_km: Vec<f64>,
}

/// Evaluate the model at every raster pixel.
pub fn evaluate_grid(ctx: &EngineContext, inp: &PathInputs, tx: &TxSite) -> ScalarField {
    let mut muf = vec![0.0f64; MAP_W * MAP_H];
    let mut rel = vec![0.0f64; MAP_W * MAP_H];
    let mut dist = vec![0.0f64; MAP_W * MAP_H];

    muf.par_chunks_mut(MAP_W)
        .zip(rel.par_chunks_mut(MAP_W))
        .zip(dist.par_chunks_mut(MAP_W))
        .enumerate()
        .for_each(|(y, ((muf_row, rel_row), dist_row))| {
            let sin_lat = ctx.sin_lat[y];
            let cos_lat = ctx.cos_lat[y];
            for x in 0..MAP_W {
                let (m, r, d) = evaluate_path(inp, tx, sin_lat, cos_lat, ctx.lng_rad[x]);
                muf_row[x] = m;
                rel_row[x] = r;
                dist_row[x] = d;
            }
        });

    ScalarField { muf, rel, dist_km: dist }
}

/// 5-point smoother with periodic wrap on the longitude axis and edge
/// clamping on latitude. The wrap is what removes the 180-meridian seam.
pub fn smooth_wrapped(v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0f64; MAP_W * MAP_H];
    for y in 0..MAP_H {
        let up = if y == 0 { 0 } else { y - 1 };
        let down = if y == MAP_H - 1 { y } else { y + 1 };
        for x in 0..MAP_W {
            let left = (x + MAP_W - 1) % MAP_W;
            let right = (x + 1) % MAP_W;
            out[y * MAP_W + x] = (v[y * MAP_W + x] * 4.0
                + v[y * MAP_W + left]
                + v[y * MAP_W + right]
                + v[up * MAP_W + x]
                + v[down * MAP_W + x])
                / 8.0;
        }
    }
    out
}

/// Deterministic ordered-dither offset for a pixel.
#[inline]
pub fn grain(x: usize, y: usize) -> f64 {
    (((x * 13) ^ (y * 17)) & 7) as f64 / 100.0 - 0.035
}

/// Generate the primary + dimmed blobs for a request.
///
/// Pure given (request, space weather, context); the caller handles
/// caching.
pub fn generate_map(ctx: &EngineContext, req: &MapRequest, wx: &SpaceWeather) -> MapBlobs {
    let mhz = if req.is_muf() { 0.0 } else { req.mhz };
    let long_path = req.path == PathKind::Long;
    let inp = PathInputs::new(req.month, req.utc, wx, mhz, req.toa, long_path);
    let tx = TxSite::new(req.tx_lat.to_radians(), req.tx_lng.to_radians(), &inp);

    let field = evaluate_grid(ctx, &inp, &tx);
    let raw = if req.is_muf() { &field.muf } else { &field.rel };
    let smoothed = smooth_wrapped(raw);

    let mut colors = vec![0u16; MAP_W * MAP_H];
    let mut strength = vec![0.0f64; MAP_W * MAP_H];

    if req.is_muf() {
        for y in 0..MAP_H {
            for x in 0..MAP_W {
                let i = y * MAP_W + x;
                let val = (smoothed[i] + grain(x, y) * 5.0).clamp(0.0, 50.0);
                colors[i] = ctx.tables.muf_color(val);
                strength[i] = (val / 35.0).clamp(0.0, 1.0);
            }
        }
    } else {
        // Grayline ducting bump where both endpoints sit near the
        // terminator.
        let cos_z_tx = cos_solar_zenith(
            req.tx_lat.to_radians(),
            req.tx_lng.to_radians(),
            inp.s_dec,
            inp.s_lng,
        );
        for y in 0..MAP_H {
            for x in 0..MAP_W {
                let i = y * MAP_W + x;
                let val = (smoothed[i] + grain(x, y)).clamp(0.0, 1.0);
                let cos_z_rx =
                    cos_solar_zenith(ctx.lat_rad[y], ctx.lng_rad[x], inp.s_dec, inp.s_lng);
                let duct = 0.85
                    * (-(cos_z_tx.abs().min(cos_z_rx.abs()) / 0.07).powi(2)).exp();
                // Band reliability to 10% steps before the table lookup.
                let rel_pct = (val * 10.0 * (1.0 + duct)).round() * 10.0;

                colors[i] = if req.kind == MapKind::TakeOffAngle {
                    if rel_pct > 20.0 {
                        ctx.tables.toa_color(2.0 + field.dist_km[i] / 1000.0 * 8.0)
                    } else {
                        ctx.tables.toa_void()
                    }
                } else {
                    ctx.tables.rel_color(rel_pct)
                };
                strength[i] = val;
            }
        }
    }

    render_pair(ctx, req, &colors, &strength)
}
