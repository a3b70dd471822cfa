//! Point-to-point evaluation for band-condition tables.

use crate::model::{evaluate_path, PathInputs, TxSite};
use crate::request::PathKind;
use crate::spacewx::SpaceWeather;

/// Evaluate a single TX -> RX link. Inputs in degrees / MHz / hours.
/// Returns (MUF, reliability).
#[allow(clippy::too_many_arguments)]
pub fn evaluate_point(
    tx_lat: f64,
    tx_lng: f64,
    rx_lat: f64,
    rx_lng: f64,
    mhz: f64,
    toa: f64,
    month: u32,
    utc: f64,
    path: PathKind,
    wx: &SpaceWeather,
) -> (f64, f64) {
    let inp = PathInputs::new(month, utc, wx, mhz, toa, path == PathKind::Long);
    let tx = TxSite::new(tx_lat.to_radians(), tx_lng.to_radians(), &inp);
    let rx_lat_rad = rx_lat.to_radians();
    let (muf, rel, _dist) = evaluate_path(
        &inp,
        &tx,
        rx_lat_rad.sin(),
        rx_lat_rad.cos(),
        rx_lng.to_radians(),
    );
    (muf, rel.clamp(0.0, 1.0))
}
