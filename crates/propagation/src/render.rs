//! Colour grid to client blobs.

use codecs::{blend_rgb565, bmp565_header, dim_rgb565, zlib_compress};

use crate::cache::MapBlobs;
use crate::context::EngineContext;
use crate::request::MapRequest;
use crate::{MAP_H, MAP_W};

/// Blend, mask, resize and compress the primary and dimmed copies.
pub fn render_pair(
    ctx: &EngineContext,
    req: &MapRequest,
    colors: &[u16],
    strength: &[f64],
) -> MapBlobs {
    let header = bmp565_header(req.width, req.height);
    let mut blobs: Vec<Vec<u8>> = Vec::with_capacity(2);

    for dimmed in [false, true] {
        let mut grid: Vec<u16> = if dimmed {
            colors.iter().map(|&c| dim_rgb565(c)).collect()
        } else {
            colors.to_vec()
        };

        if let Some(bg) = &ctx.background {
            for i in 0..grid.len() {
                let alpha = (0.4 + 0.4 * strength[i]) as f32;
                grid[i] = blend_rgb565(grid[i], bg[i], alpha);
            }
        }
        if let Some(mask) = &ctx.mask {
            for i in 0..grid.len() {
                if mask[i] > 0 {
                    grid[i] = 0x0000;
                }
            }
        }

        let resized = resize_nearest(&grid, req.width as usize, req.height as usize);

        let mut payload = Vec::with_capacity(header.len() + resized.len() * 2);
        payload.extend_from_slice(&header);
        for px in resized {
            payload.extend_from_slice(&px.to_le_bytes());
        }
        blobs.push(zlib_compress(&payload));
    }

    let dimmed = blobs.pop().expect("two rendered copies");
    let primary = blobs.pop().expect("two rendered copies");
    MapBlobs { primary, dimmed }
}

/// Nearest-index subsample from the native raster to the requested size.
fn resize_nearest(grid: &[u16], target_w: usize, target_h: usize) -> Vec<u16> {
    if target_w == MAP_W && target_h == MAP_H {
        return grid.to_vec();
    }
    let mut out = Vec::with_capacity(target_w * target_h);
    for y in 0..target_h {
        let sy = y * MAP_H / target_h;
        for x in 0..target_w {
            let sx = x * MAP_W / target_w;
            out.push(grid[sy * MAP_W + sx]);
        }
    }
    out
}
