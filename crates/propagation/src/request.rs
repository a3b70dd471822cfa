//! Typed request parameters for the propagation surfaces.

/// Which scalar field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Reliability,
    Muf,
    TakeOffAngle,
}

/// Great-circle direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Short,
    Long,
}

impl PathKind {
    /// Legacy numeric code: 0 = short path, anything else = long path.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            PathKind::Long
        } else {
            PathKind::Short
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PathKind::Short => "SP",
            PathKind::Long => "LP",
        }
    }
}

/// Operating modes the client selects by numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cw,
    Ssb,
    Usb,
    Lsb,
    Ft8,
}

impl Mode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Mode::Cw),
            38 => Some(Mode::Ssb),
            39 => Some(Mode::Usb),
            40 => Some(Mode::Lsb),
            19 => Some(Mode::Ft8),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Cw => "CW",
            Mode::Ssb => "SSB",
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::Ft8 => "FT8",
        }
    }
}

/// Quantise to two decimals; both the cache key and the evaluation use the
/// quantised value, so requests with equal fingerprints produce identical
/// bytes.
pub fn quantize(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A fully parsed propagation-map request.
#[derive(Debug, Clone)]
pub struct MapRequest {
    pub width: u32,
    pub height: u32,
    pub tx_lat: f64,
    pub tx_lng: f64,
    pub mhz: f64,
    pub toa: f64,
    pub year: i32,
    pub month: u32,
    pub utc: f64,
    pub path: PathKind,
    pub kind: MapKind,
}

impl MapRequest {
    /// Apply range clamps and two-decimal quantisation to every
    /// continuous parameter.
    pub fn normalized(mut self) -> Self {
        self.tx_lat = quantize(self.tx_lat.clamp(-90.0, 90.0));
        self.tx_lng = quantize(self.tx_lng.clamp(-180.0, 180.0));
        self.mhz = quantize(self.mhz.clamp(0.0, 60.0));
        self.toa = quantize(self.toa.clamp(0.0, 40.0));
        self.utc = quantize(self.utc.rem_euclid(24.0));
        self.month = self.month.clamp(1, 12);
        if self.width == 0 || self.height == 0 {
            self.width = crate::MAP_W as u32;
            self.height = crate::MAP_H as u32;
        }
        self
    }

    /// MUF mode is requested either explicitly or by the zero-frequency
    /// sentinel.
    pub fn is_muf(&self) -> bool {
        self.kind == MapKind::Muf || self.mhz == 0.0
    }

    /// Cache key over every parameter that affects the output bytes.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}x{}:{:.2}:{:.2}:{:.2}:{:.2}:{}:{}:{:.2}:{}:{:?}",
            self.width,
            self.height,
            self.tx_lat,
            self.tx_lng,
            self.mhz,
            self.toa,
            self.year,
            self.month,
            self.utc,
            self.path.label(),
            self.kind,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> MapRequest {
        MapRequest {
            width: 660,
            height: 330,
            tx_lat: 45.0,
            tx_lng: -75.0,
            mhz: 14.0,
            toa: 3.0,
            year: 2026,
            month: 2,
            utc: 12.0,
            path: PathKind::Short,
            kind: MapKind::Reliability,
        }
    }

    #[test]
    fn fingerprint_ignores_sub_centidegree_noise() {
        let a = req().normalized();
        let mut b = req();
        b.tx_lat = 45.0012;
        let b = b.normalized();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_separates_kinds_and_paths() {
        let a = req().normalized();
        let mut b = req();
        b.kind = MapKind::Muf;
        assert_ne!(a.fingerprint(), b.normalized().fingerprint());
        let mut c = req();
        c.path = PathKind::Long;
        assert_ne!(a.fingerprint(), c.normalized().fingerprint());
    }

    #[test]
    fn mode_codes() {
        assert_eq!(Mode::from_code(38), Some(Mode::Ssb));
        assert_eq!(Mode::from_code(19), Some(Mode::Ft8));
        assert_eq!(Mode::from_code(2), None);
    }

    #[test]
    fn muf_sentinel() {
        let mut r = req();
        r.mhz = 0.0;
        assert!(r.normalized().is_muf());
    }
}
