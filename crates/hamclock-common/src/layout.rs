//! Artifact directory layout.
//!
//! Every on-disk artifact the client reads lives under a single root
//! (default `data/processed_data`). All path construction goes through
//! this value object; call sites never concatenate path strings.

use std::path::{Path, PathBuf};

/// Owns the artifact tree layout.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // === Sliding-window series ===

    pub fn ssn(&self) -> PathBuf {
        self.root.join("ssn").join("ssn-31.txt")
    }

    pub fn solar_flux(&self) -> PathBuf {
        self.root.join("solar-flux").join("solarflux-99.txt")
    }

    pub fn kindex(&self) -> PathBuf {
        self.root.join("geomag").join("kindex.txt")
    }

    pub fn xray(&self) -> PathBuf {
        self.root.join("xray").join("xray.txt")
    }

    pub fn solar_wind(&self) -> PathBuf {
        self.root.join("solar-wind").join("swind-24hr.txt")
    }

    pub fn bz(&self) -> PathBuf {
        self.root.join("Bz").join("Bz.txt")
    }

    pub fn aurora(&self) -> PathBuf {
        self.root.join("aurora").join("aurora.txt")
    }

    pub fn dst(&self) -> PathBuf {
        self.root.join("dst").join("dst.txt")
    }

    // === Space weather scales ===

    pub fn noaa_scales(&self) -> PathBuf {
        self.root.join("NOAASpaceWX").join("noaaswx.txt")
    }

    pub fn rank_coeffs(&self) -> PathBuf {
        self.root.join("NOAASpaceWX").join("rank2_coeffs.txt")
    }

    // === Catalogues ===

    pub fn cty(&self) -> PathBuf {
        self.root.join("cty").join("cty_wt_mod-ll-dxcc.txt")
    }

    pub fn onta(&self) -> PathBuf {
        self.root.join("ONTA").join("onta.txt")
    }

    pub fn dxpeds(&self) -> PathBuf {
        self.root.join("dxpeds").join("dxpeditions.txt")
    }

    pub fn contests(&self) -> PathBuf {
        self.root.join("contests").join("contests311.txt")
    }

    // === DRAP absorption ===

    pub fn drap_stats(&self) -> PathBuf {
        self.root.join("drap").join("stats.history")
    }

    pub fn drap_map(&self) -> PathBuf {
        self.root.join("map-D-DRAP.bmp")
    }

    pub fn drap_map_z(&self) -> PathBuf {
        self.root.join("map-D-DRAP.bmp.z")
    }

    // === World weather grid ===

    pub fn worldwx(&self) -> PathBuf {
        self.root.join("worldwx").join("wx.txt")
    }

    pub fn worldwx_cache(&self) -> PathBuf {
        self.root.join("worldwx").join("grid_cache.json")
    }

    pub fn worldwx_cursor(&self) -> PathBuf {
        self.root.join("worldwx").join("fetch_state.json")
    }

    // === Engine base maps ===

    pub fn countries_map(&self) -> PathBuf {
        self.root.join("map-D-660x330-Countries.bmp")
    }

    pub fn terrain_map(&self) -> PathBuf {
        self.root.join("map-D-660x330-Terrain.bmp")
    }

    pub fn countries_mask(&self) -> PathBuf {
        self.root.join("countries_mask.bin")
    }

    /// Resolve a static-surface request path to a file under the root.
    ///
    /// Rejects any component that would escape the artifact tree.
    pub fn static_file(&self, request_path: &str) -> Option<PathBuf> {
        let rel = request_path.trim_start_matches('/');
        if rel.is_empty() {
            return None;
        }
        let mut out = self.root.clone();
        for part in rel.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return None;
            }
            out.push(part);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_paths_stay_under_root() {
        let layout = ArtifactLayout::new("/srv/data");
        assert_eq!(
            layout.static_file("/geomag/kindex.txt").unwrap(),
            PathBuf::from("/srv/data/geomag/kindex.txt")
        );
        assert!(layout.static_file("/../etc/passwd").is_none());
        assert!(layout.static_file("/geomag/../../etc/passwd").is_none());
        assert!(layout.static_file("/").is_none());
    }

    #[test]
    fn series_paths_match_client_surface() {
        let layout = ArtifactLayout::new("data/processed_data");
        assert!(layout.kindex().ends_with("geomag/kindex.txt"));
        assert!(layout.ssn().ends_with("ssn/ssn-31.txt"));
        assert!(layout.bz().ends_with("Bz/Bz.txt"));
    }
}
