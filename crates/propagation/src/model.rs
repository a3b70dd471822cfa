//! Per-path evaluation of the empirical propagation model.
//!
//! One great-circle path TX -> RX is sampled at fractions 1/4, 1/2, 3/4
//! by normalized 3-D vector interpolation (seamless across the 180
//! meridian and safe at the antipode) and the samples are aggregated with
//! weights 1/4, 1/2, 1/4.

use hamclock_common::geo::{
    cos_solar_zenith, distance_azimuth, geomagnetic_latitude, interpolate_unit, subsolar_point,
    unit_vector, vector_lat_lng, wrap_angle, EARTH_CIRCUMFERENCE_KM, EARTH_RADIUS_KM,
    F_LAYER_RADIUS_KM,
};

use crate::spacewx::SpaceWeather;

/// Base hop length before take-off/frequency/refraction scaling, km.
const HOP_BASE_KM: f64 = 3100.0;
/// Logistic reliability slope and SNR-margin threshold.
const LOGISTIC_SLOPE: f64 = 25.0;
const LOGISTIC_THRESHOLD: f64 = 0.70;
/// Free-space-ish path loss coefficient per km.
const PATH_LOSS_COEFF: f64 = 6.5e-5;
/// D-layer absorption strength.
const ABSORPTION_COEFF: f64 = 5.0;

const SAMPLE_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];
const SAMPLE_WEIGHTS: [f64; 3] = [0.25, 0.5, 0.25];

/// Request-level inputs shared by every pixel of a map (or the single
/// point of a band-conditions evaluation).
pub struct PathInputs {
    pub s_dec: f64,
    pub s_lng: f64,
    pub sin_s_dec: f64,
    pub cos_s_dec: f64,
    pub muf_base: f64,
    /// Operating frequency; 0 selects MUF mode (the per-sample MUF stands
    /// in for the frequency so the reliability math stays finite).
    pub mhz: f64,
    pub toa: f64,
    pub f_trans: f64,
    pub kp: f64,
    pub bz: f64,
    pub wind_speed: f64,
    pub kp_depression: f64,
    pub long_path: bool,
}

impl PathInputs {
    pub fn new(month: u32, utc: f64, wx: &SpaceWeather, mhz: f64, toa: f64, long_path: bool) -> Self {
        let (s_dec, s_lng) = subsolar_point(month, utc);
        let kp_depression = (1.0 - 0.05 * (wx.kp - 3.0).max(0.0)).clamp(0.5, 1.0);
        Self {
            s_dec,
            s_lng,
            sin_s_dec: s_dec.sin(),
            cos_s_dec: s_dec.cos(),
            muf_base: 5.0 + 0.1 * wx.ssn,
            mhz,
            toa,
            f_trans: 1.0 / (1.0 + (mhz / 35.0).powi(2)),
            kp: wx.kp,
            bz: wx.bz,
            wind_speed: wx.wind_speed,
            kp_depression,
            long_path,
        }
    }
}

/// Per-request transmitter geometry.
pub struct TxSite {
    pub lat: f64,
    pub lng: f64,
    pub sin_lat: f64,
    pub cos_lat: f64,
    pub vec: [f64; 3],
    /// Azimuth from TX toward the subsolar point.
    pub solar_az: f64,
}

impl TxSite {
    pub fn new(lat_rad: f64, lng_rad: f64, inp: &PathInputs) -> Self {
        let solar_az = ((inp.s_lng - lng_rad).sin() * inp.cos_s_dec).atan2(
            lat_rad.cos() * inp.sin_s_dec
                - lat_rad.sin() * inp.cos_s_dec * (inp.s_lng - lng_rad).cos(),
        );
        Self {
            lat: lat_rad,
            lng: lng_rad,
            sin_lat: lat_rad.sin(),
            cos_lat: lat_rad.cos(),
            vec: unit_vector(lat_rad, lng_rad),
            solar_az,
        }
    }
}

/// Evaluate one TX -> RX path. Returns (MUF, reliability, distance km).
///
/// Infallible: every numeric hazard is clamped or nudged.
pub fn evaluate_path(
    inp: &PathInputs,
    tx: &TxSite,
    rx_sin_lat: f64,
    rx_cos_lat: f64,
    rx_lng: f64,
) -> (f64, f64, f64) {
    let d_lon = rx_lng - tx.lng;
    let mut az = (d_lon.sin() * rx_cos_lat)
        .atan2(tx.cos_lat * rx_sin_lat - tx.sin_lat * rx_cos_lat * d_lon.cos());
    let cos_c =
        (tx.sin_lat * rx_sin_lat + tx.cos_lat * rx_cos_lat * d_lon.cos()).clamp(-1.0, 1.0);
    let mut dist_km = cos_c.acos() * EARTH_RADIUS_KM;

    if inp.long_path {
        dist_km = EARTH_CIRCUMFERENCE_KM - dist_km;
        az = wrap_angle(az + std::f64::consts::PI);
    }

    let rel_az = wrap_angle((az - tx.solar_az).abs());
    let gray_tangent = 1.0 + 0.45 * (rel_az.abs() - std::f64::consts::FRAC_PI_2).cos().powi(4);
    let mag_az = 1.0 + 0.4 * az.cos().powi(2);
    let combo_az = (gray_tangent + mag_az) / 2.0;
    let az_layer = rel_az.cos().powi(2);

    let rx_vec = [rx_cos_lat * rx_lng.cos(), rx_cos_lat * rx_lng.sin(), rx_sin_lat];

    let dist_norm = dist_km / 1000.0;
    let mut sum_muf = 0.0;
    let mut sum_rel = 0.0;

    for (i, &frac) in SAMPLE_FRACTIONS.iter().enumerate() {
        let mut sv = interpolate_unit(tx.vec, rx_vec, frac);
        if inp.long_path {
            sv = [-sv[0], -sv[1], -sv[2]];
        }
        let (slat, slng) = vector_lat_lng(sv);

        let cos_z = cos_solar_zenith(slat, slng, inp.s_dec, inp.s_lng);
        let sun_angle = cos_z.clamp(-1.0, 1.0).acos();
        let projected = ((EARTH_RADIUS_KM / F_LAYER_RADIUS_KM) * sun_angle.sin())
            .clamp(-1.0, 1.0)
            .asin();
        let cos_z_proj = projected.cos();

        let zenith_layer = (cos_z_proj + 0.1).max(0.0).powf(0.75);

        let mut reflection = (0.4 + 0.6 * zenith_layer) * (0.8 + 0.2 * az_layer);
        if cos_z <= -0.1 {
            // Collapse toward a night floor; the polar cap under the
            // opposite-season pole keeps a slightly higher residual.
            let is_polar = (inp.s_dec < -0.1 && slat < -0.8) || (inp.s_dec > 0.1 && slat > 0.8);
            let floor = if is_polar { 0.4 * (slat - inp.s_dec).cos() } else { 0.25 };
            reflection = floor + (reflection - floor) * ((cos_z + 0.1) * 8.0).exp();
        }

        let refraction = 1.0
            + dist_norm
                * (1.0 - cos_z_proj)
                * 0.045
                * combo_az
                * inp.f_trans
                * (1.1 - 0.1 * az_layer);

        let mag_lat = geomagnetic_latitude(slat, slng);
        let mag_deg = mag_lat.to_degrees();
        let freq_for_loss = if inp.mhz > 0.0 { inp.mhz } else { inp.muf_base.max(0.5) };
        let pca_loss =
            (-1.2 * mag_lat.sin().powi(4) * (20.0 / freq_for_loss).powf(1.5)).exp();
        let m_bend = 0.85
            + 0.65 * mag_lat.cos().powf(2.5)
            + 1.1 * (((mag_deg - 15.5) / 6.5).powi(2).neg_exp()
                + ((mag_deg + 15.5) / 6.5).powi(2).neg_exp());

        let sample_muf = inp.muf_base * reflection * m_bend * inp.kp_depression;
        sum_muf += sample_muf * SAMPLE_WEIGHTS[i];

        let terminator = 1.0 / (1.0 + (-35.0 * (cos_z + 0.04)).exp());
        let safe_muf = sample_muf.max(0.5);
        let mhz = if inp.mhz > 0.0 { inp.mhz } else { safe_muf };

        let hop_len = HOP_BASE_KM
            * (1.0 / (1.0 + inp.toa / 35.0))
            * (0.55 + 0.45 * (mhz / safe_muf))
            * refraction;
        let resonance = 0.45
            + 3.4
                * ((std::f64::consts::PI * dist_km / hop_len).cos().powi(6)
                    + 0.55 * (std::f64::consts::PI * dist_km / (hop_len * 1.35)).cos().powi(4));

        let elevation = (1800.0 / hop_len.max(20.0)).atan();
        let reflection_eff = elevation.sin().powf(0.3);
        let absorption =
            (-ABSORPTION_COEFF * terminator * zenith_layer * (10.0 / mhz).powf(2.2)).exp();
        let path_loss = 1.0 / (1.0 + PATH_LOSS_COEFF * dist_km * (1.0 / combo_az.max(0.2)));

        let margin = (sample_muf / mhz)
            * resonance
            * absorption
            * reflection_eff
            * path_loss
            * pca_loss;

        let mut storm = 1.0;
        if inp.bz < -1.0 && mag_deg.abs() > 75.0 - 2.0 * inp.kp {
            storm *= 0.5;
        }
        if inp.wind_speed > 550.0 && mag_deg.abs() > 70.0 {
            storm *= 0.8;
        }

        let exponent = (LOGISTIC_SLOPE * (margin - LOGISTIC_THRESHOLD)).clamp(-50.0, 50.0);
        let rel = storm / (1.0 + (-exponent).exp());
        sum_rel += rel * SAMPLE_WEIGHTS[i];
    }

    (sum_muf, sum_rel, dist_km)
}

/// `exp(-x)` helper so the anomaly gaussians read like the formula.
trait NegExp {
    fn neg_exp(self) -> f64;
}

impl NegExp for f64 {
    fn neg_exp(self) -> f64 {
        (-self).exp()
    }
}

/// Distance and azimuth for a request, honoring path direction.
pub fn request_distance_azimuth(
    tx_lat: f64,
    tx_lng: f64,
    rx_lat: f64,
    rx_lng: f64,
    long_path: bool,
) -> (f64, f64) {
    let (mut d, mut az) = distance_azimuth(tx_lat, tx_lng, rx_lat, rx_lng);
    if long_path {
        d = EARTH_CIRCUMFERENCE_KM - d;
        az = wrap_angle(az + std::f64::consts::PI);
    }
    (d, az)
}
