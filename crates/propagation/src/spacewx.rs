//! Current space-weather inputs read from the artifact tree.

use std::fs;
use std::path::Path;

use hamclock_common::ArtifactLayout;
use tracing::debug;

/// The scalar drivers the engine samples per request.
#[derive(Debug, Clone, Copy)]
pub struct SpaceWeather {
    /// Smoothed sunspot number.
    pub ssn: f64,
    /// Current planetary K index.
    pub kp: f64,
    /// Interplanetary magnetic field Bz, nT.
    pub bz: f64,
    /// Solar-wind speed, km/s.
    pub wind_speed: f64,
}

impl SpaceWeather {
    /// Quiet-sun defaults used when an artifact is missing or unreadable.
    pub fn quiet() -> Self {
        Self { ssn: 70.0, kp: 0.0, bz: 0.0, wind_speed: 400.0 }
    }

    /// Read the latest values from the artifact tree.
    pub fn read(layout: &ArtifactLayout) -> Self {
        let mut wx = Self::quiet();
        if let Some(ssn) = read_ssn(&layout.ssn()) {
            wx.ssn = ssn;
        }
        if let Some(kp) = read_kp(&layout.kindex()) {
            wx.kp = kp;
        }
        if let Some(bz) = read_bz(&layout.bz()) {
            wx.bz = bz;
        }
        if let Some(speed) = read_wind_speed(&layout.solar_wind()) {
            wx.wind_speed = speed;
        }
        debug!(ssn = wx.ssn, kp = wx.kp, bz = wx.bz, wind = wx.wind_speed, "space weather inputs");
        wx
    }
}

/// Last line of `ssn-31.txt` is `YYYY MM DD SSN`.
fn read_ssn(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    let last = text.lines().filter(|l| !l.trim().is_empty()).last()?;
    let parts: Vec<&str> = last.split_whitespace().collect();
    if parts.len() >= 4 {
        parts[3].parse().ok()
    } else {
        None
    }
}

/// `kindex.txt` carries 56 observed values followed by 16 forecast; the
/// current Kp is the last observed one.
fn read_kp(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    let values: Vec<f64> = text.lines().filter_map(|l| l.trim().parse().ok()).collect();
    if values.len() >= 56 {
        Some(values[55])
    } else {
        values.last().copied()
    }
}

/// Last data line of `Bz.txt` is `ts Bx By Bz Bt`.
fn read_bz(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    let last = text
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .last()?;
    last.split_whitespace().nth(3)?.parse().ok()
}

/// Last line of `swind-24hr.txt` is `ts density speed`.
fn read_wind_speed(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    let last = text.lines().filter(|l| !l.trim().is_empty()).last()?;
    last.split_whitespace().nth(2)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamclock_common::fsio::write_atomic;

    #[test]
    fn reads_from_artifacts_with_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());

        // nothing on disk yet
        let wx = SpaceWeather::read(&layout);
        assert_eq!(wx.ssn, 70.0);

        write_atomic(&layout.ssn(), b"2026 01 30 95\n2026 01 31 131\n").unwrap();
        let mut kp = String::new();
        for i in 0..72 {
            kp.push_str(&format!("{:.2}\n", if i == 55 { 4.33 } else { 2.0 }));
        }
        write_atomic(&layout.kindex(), kp.as_bytes()).unwrap();
        write_atomic(
            &layout.bz(),
            b"# UNIX        Bx     By     Bz     Bt\n1760000000    0.1   -0.4   -2.3    2.4\n",
        )
        .unwrap();
        write_atomic(&layout.solar_wind(), b"1760000000 3.2 418.6\n").unwrap();

        let wx = SpaceWeather::read(&layout);
        assert_eq!(wx.ssn, 131.0);
        assert!((wx.kp - 4.33).abs() < 1e-9);
        assert!((wx.bz + 2.3).abs() < 1e-9);
        assert!((wx.wind_speed - 418.6).abs() < 1e-9);
    }
}
