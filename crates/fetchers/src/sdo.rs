//! Solar Dynamics Observatory imagery transcoding.
//!
//! The client requests `/SDO/<name>.bmp.z` files whose names encode a
//! wavelength and a square resolution. Each request fetches the latest
//! JPEG frame, bilinear-resizes it, frames it as a 24-bpp bottom-up
//! bitmap with normalized header fields, and zlib-compresses the result.
//! Transcodes are memoized per (wavelength, resolution) for 30 minutes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hamclock_common::{FetchError, FetchResult};
use image::imageops::FilterType;
use regex::Regex;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::get_bytes;

const SDO_BASE_URL: &str = "https://sdo.gsfc.nasa.gov/assets/img/latest/";

const MEMO_TTL: Duration = Duration::from_secs(1800);
const ALLOWED_RESOLUTIONS: [u32; 4] = [170, 340, 510, 680];

/// Wavelength tag and the upstream file serving it.
const SDO_SOURCES: [(&str, &str); 8] = [
    ("HMIB", "latest_1024_HMIB.jpg"),
    ("HMIIC", "latest_1024_HMIIC.jpg"),
    ("HMI", "latest_1024_HMIIC.jpg"),
    ("131", "latest_1024_0131.jpg"),
    ("171", "latest_1024_0171.jpg"),
    ("193", "latest_1024_0193.jpg"),
    ("211", "latest_1024_0211.jpg"),
    ("304", "latest_1024_0304.jpg"),
];

/// Pick the wavelength tag out of a requested filename.
pub fn parse_wavelength(filename: &str) -> &'static str {
    for (tag, _) in SDO_SOURCES {
        if filename.contains(tag) {
            return tag;
        }
    }
    // Legacy "170" names map to the 171 channel.
    "171"
}

/// Pick the output resolution: the first three-digit group naming a size
/// the client lays out for.
pub fn parse_resolution(filename: &str) -> u32 {
    let re = Regex::new(r"\d{3}").expect("static regex");
    let matches: Vec<u32> = re
        .find_iter(filename)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .collect();
    matches
        .into_iter()
        .find(|r| ALLOWED_RESOLUTIONS.contains(r))
        .unwrap_or(170)
}

fn source_file(wavelength: &str) -> &'static str {
    SDO_SOURCES
        .iter()
        .find(|(tag, _)| *tag == wavelength)
        .map(|(_, file)| *file)
        .unwrap_or("latest_1024_0171.jpg")
}

/// Frame RGB pixels as a zlib-compressed 24-bpp bitmap.
pub fn encode_bmp24_z(rgb: &[u8], w: u32, h: u32) -> Vec<u8> {
    let row_bytes = ((w * 3 + 3) / 4 * 4) as usize;
    let mut bmp = codecs::bmp24_header(w, h);
    bmp.reserve(row_bytes * h as usize);
    // bottom-up rows, BGR order, padded to 4 bytes
    for y in (0..h as usize).rev() {
        let row_start = y * w as usize * 3;
        for x in 0..w as usize {
            let px = row_start + x * 3;
            bmp.push(rgb[px + 2]);
            bmp.push(rgb[px + 1]);
            bmp.push(rgb[px]);
        }
        for _ in (w as usize * 3)..row_bytes {
            bmp.push(0);
        }
    }
    codecs::zlib_compress(&bmp)
}

/// Memoized transcoder shared by the request handlers.
pub struct SdoCache {
    entries: Mutex<HashMap<String, (Instant, Arc<Vec<u8>>)>>,
}

impl SdoCache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Serve a request filename, fetching and transcoding on miss.
    pub async fn fetch(&self, client: &Client, filename: &str) -> FetchResult<Arc<Vec<u8>>> {
        let wavelength = parse_wavelength(filename);
        let resolution = parse_resolution(filename);
        let key = format!("{wavelength}_{resolution}");

        {
            let entries = self.entries.lock().await;
            if let Some((at, blob)) = entries.get(&key) {
                if at.elapsed() < MEMO_TTL {
                    debug!(key = %key, "serving solar image from memo");
                    return Ok(blob.clone());
                }
            }
        }

        let url = format!("{SDO_BASE_URL}{}", source_file(wavelength));
        info!(key = %key, "transcoding fresh solar image");
        let jpeg = get_bytes(client, &url, Duration::from_secs(15)).await?;

        let img = image::load_from_memory(&jpeg)
            .map_err(|e| FetchError::Parse(format!("jpeg decode: {e}")))?;
        let resized = img.resize_exact(resolution, resolution, FilterType::Triangle);
        let rgb = resized.to_rgb8();
        let blob = Arc::new(encode_bmp24_z(rgb.as_raw(), resolution, resolution));

        self.entries
            .lock()
            .await
            .insert(key, (Instant::now(), blob.clone()));
        Ok(blob)
    }
}

impl Default for SdoCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn wavelength_from_filenames() {
        assert_eq!(parse_wavelength("f_304_170.bmp"), "304");
        assert_eq!(parse_wavelength("latest_170_HMIB.bmp"), "HMIB");
        assert_eq!(parse_wavelength("mystery.bmp"), "171");
        assert_eq!(parse_wavelength("f_170_340.bmp"), "171");
    }

    #[test]
    fn resolution_constrained_to_layouts() {
        assert_eq!(parse_resolution("f_171_340.bmp"), 340);
        assert_eq!(parse_resolution("f_304_170.bmp"), 170);
        assert_eq!(parse_resolution("nothing.bmp"), 170);
    }

    #[test]
    fn bmp24_frame_round_trips_through_zlib() {
        let w = 6u32;
        let h = 2u32;
        let rgb: Vec<u8> = (0..(w * h * 3) as usize).map(|i| i as u8).collect();
        let z = encode_bmp24_z(&rgb, w, h);

        let mut raw = Vec::new();
        flate2::read::ZlibDecoder::new(&z[..])
            .read_to_end(&mut raw)
            .unwrap();
        assert_eq!(&raw[..2], b"BM");
        let row = (w * 3 + 3) / 4 * 4;
        assert_eq!(raw.len(), 54 + (row * h) as usize);
        // bottom-up: the first stored pixel is the top of the last RGB row,
        // in BGR order.
        let last_row = ((h - 1) * w * 3) as usize;
        assert_eq!(raw[54], rgb[last_row + 2]);
        assert_eq!(raw[55], rgb[last_row + 1]);
        assert_eq!(raw[56], rgb[last_row]);
    }
}
