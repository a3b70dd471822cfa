//! Solar and great-circle geometry.
//!
//! All angles are radians unless a name says otherwise. The Earth is the
//! 6371 km sphere throughout; the F layer sits 350 km above it.

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle circumference of the 6371 km sphere.
pub const EARTH_CIRCUMFERENCE_KM: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_KM;

/// F-layer shell radius (350 km altitude).
pub const F_LAYER_RADIUS_KM: f64 = EARTH_RADIUS_KM + 350.0;

/// Geomagnetic dipole pole, degrees.
const DIPOLE_LAT_DEG: f64 = 80.5;
const DIPOLE_LNG_DEG: f64 = -72.5;

/// Subsolar point for the given month and UTC hour.
///
/// The day of month is fixed at 15 (mid-month climatology) and the equation
/// of time is ignored. Returns (declination, subsolar longitude) in radians.
pub fn subsolar_point(month: u32, utc: f64) -> (f64, f64) {
    const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let m = month.clamp(1, 12) as usize;
    let doy: u32 = DAYS_IN_MONTH[..m - 1].iter().sum::<u32>() + 15;
    let dec = 23.44 * (360.0_f64 / 365.25 * (doy as f64 - 81.0)).to_radians().sin();
    let sub_lng = (12.0 - utc) * 15.0;
    (dec.to_radians(), sub_lng.to_radians())
}

/// Great-circle distance (km) and initial azimuth (rad) from TX to RX.
///
/// Spherical law of cosines for distance; atan2 on the local ENU
/// projection for azimuth. Inputs in radians.
pub fn distance_azimuth(tx_lat: f64, tx_lng: f64, rx_lat: f64, rx_lng: f64) -> (f64, f64) {
    let d_lon = rx_lng - tx_lng;
    let y = d_lon.sin() * rx_lat.cos();
    let x = tx_lat.cos() * rx_lat.sin() - tx_lat.sin() * rx_lat.cos() * d_lon.cos();
    let az = y.atan2(x);

    let cos_c = (tx_lat.sin() * rx_lat.sin() + tx_lat.cos() * rx_lat.cos() * d_lon.cos())
        .clamp(-1.0, 1.0);
    (cos_c.acos() * EARTH_RADIUS_KM, az)
}

/// Cosine of the solar zenith angle at (lat, lng) for a subsolar point.
pub fn cos_solar_zenith(lat: f64, lng: f64, s_dec: f64, s_lng: f64) -> f64 {
    lat.sin() * s_dec.sin() + lat.cos() * s_dec.cos() * (lng - s_lng).cos()
}

/// Geomagnetic latitude under the tilted dipole, radians.
pub fn geomagnetic_latitude(lat: f64, lng: f64) -> f64 {
    let pole_lat = DIPOLE_LAT_DEG.to_radians();
    let pole_lng = DIPOLE_LNG_DEG.to_radians();
    let s = lat.sin() * pole_lat.sin() + lat.cos() * pole_lat.cos() * (lng - pole_lng).cos();
    s.clamp(-1.0, 1.0).asin()
}

/// Unit vector for a (lat, lng) point, radians.
pub fn unit_vector(lat: f64, lng: f64) -> [f64; 3] {
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Linear interpolation between two unit vectors, re-normalized.
///
/// This is what keeps path sampling seamless across the 180° meridian.
/// Near the antipode the chord midpoint collapses to the origin; a tiny
/// magnitude is replaced by 1.0 so the division stays finite.
pub fn interpolate_unit(a: [f64; 3], b: [f64; 3], frac: f64) -> [f64; 3] {
    let v = [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
    ];
    let mut mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if mag < 0.001 {
        mag = 1.0;
    }
    [v[0] / mag, v[1] / mag, v[2] / mag]
}

/// Latitude and longitude (radians) of a unit vector.
pub fn vector_lat_lng(v: [f64; 3]) -> (f64, f64) {
    (v[2].clamp(-1.0, 1.0).asin(), v[1].atan2(v[0]))
}

/// Wrap an angle into [-pi, pi).
pub fn wrap_angle(a: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut w = (a + std::f64::consts::PI) % two_pi;
    if w < 0.0 {
        w += two_pi;
    }
    w - std::f64::consts::PI
}
