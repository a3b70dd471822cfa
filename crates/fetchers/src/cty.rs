//! Country / prefix database.
//!
//! Parses the contest-style CTY_WT_MOD.DAT flat file: entity header
//! records `Name: CQ: ITU: Cont: Lat: Long: TZ: Pfx:` followed by a
//! comma-separated prefix list terminated by `;`, with per-prefix
//! `PFX<lat/lng>` coordinate overrides and `# ADIF n` comments carrying
//! the DXCC number. The source stores longitudes west-positive; the
//! client wants east-positive, so every longitude is negated.

use std::time::Duration;

use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::client::get_text;

const CTY_URL: &str = "https://download.win-test.com/files/country/CTY_WT_MOD.DAT";
const CTY_FALLBACK_URL: &str = "https://www.country-files.com/cty/cty_wt_mod.dat";

/// One output row: prefix, latitude (+N), longitude (+E), DXCC number.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixEntry {
    pub prefix: String,
    pub lat: f64,
    pub lng: f64,
    pub dxcc: String,
}

/// Parse the whole database into per-prefix entries.
pub fn parse_cty(content: &str) -> Vec<PrefixEntry> {
    let adif_re = Regex::new(r"# ADIF (\d+)").expect("static regex");
    let override_re =
        Regex::new(r"(.+)<([-+]?\d*\.?\d+)/([-+]?\d*\.?\d+)[^>]*>").expect("static regex");

    let mut entries = Vec::new();
    let mut current_adif = String::from("0");

    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }
        if let Some(caps) = adif_re.captures(line) {
            current_adif = caps[1].to_string();
            i += 1;
            continue;
        }
        if line.starts_with('#') {
            i += 1;
            continue;
        }

        if line.ends_with(':') {
            let parts: Vec<&str> = line.split(':').map(str::trim).collect();
            if parts.len() >= 8 {
                let lat = parts[4].parse::<f64>();
                let lng = parts[5].parse::<f64>();
                if let (Ok(lat), Ok(lng)) = (lat, lng) {
                    // west-positive source, east-positive output
                    let lng = -lng;

                    let mut prefix_data = String::new();
                    i += 1;
                    while i < lines.len() {
                        let p_line = lines[i].trim();
                        if p_line.starts_with('#') {
                            i += 1;
                            continue;
                        }
                        prefix_data.push_str(p_line);
                        if p_line.ends_with(';') {
                            break;
                        }
                        i += 1;
                    }

                    for raw in prefix_data.trim_end_matches(';').split(',') {
                        let p = raw.trim();
                        if p.is_empty() {
                            continue;
                        }
                        if let Some(caps) = override_re.captures(p) {
                            let prefix =
                                caps[1].trim_start_matches(['=', '*']).to_string();
                            if let (Ok(p_lat), Ok(p_lng)) =
                                (caps[2].parse::<f64>(), caps[3].parse::<f64>())
                            {
                                entries.push(PrefixEntry {
                                    prefix,
                                    lat: p_lat,
                                    lng: -p_lng,
                                    dxcc: current_adif.clone(),
                                });
                            }
                        } else {
                            entries.push(PrefixEntry {
                                prefix: p.trim_start_matches(['=', '*']).to_string(),
                                lat,
                                lng,
                                dxcc: current_adif.clone(),
                            });
                        }
                    }
                }
            }
        }
        i += 1;
    }
    entries
}

/// Render the fixed-width artifact body.
pub fn format_entries(entries: &[PrefixEntry], stamp: &str) -> String {
    let mut out = format!("# extracted from CTY_WT_MOD.DAT on {stamp}Z\n");
    out.push_str("# prefix     lat+N   lng+E  DXCC\n");
    for e in entries {
        out.push_str(&format!(
            "{:<12} {:7.2} {:7.2}  {}\n",
            e.prefix, e.lat, e.lng, e.dxcc
        ));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let content = match get_text(client, CTY_URL, Duration::from_secs(30)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "primary country-file source failed, trying fallback");
            get_text(client, CTY_FALLBACK_URL, Duration::from_secs(30)).await?
        }
    };

    let entries = parse_cty(&content);
    if entries.is_empty() {
        return Err(FetchError::Parse("no entities in country file".into()));
    }

    let stamp = chrono::Utc::now().format("%a %b %d %H:%M:%S %Y").to_string();
    fsio::write_atomic(&layout.cty(), format_entries(&entries, &stamp).as_bytes())?;

    info!(entries = entries.len(), "country/prefix database updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# ADIF 260\n\
Monaco:  14:  27:  EU:  43.73:     7.40:    -1.0:  3A:\n\
    3A;\n\
# ADIF 291\n\
United States:  05:  08:  NA:  37.53:    91.67:     5.0:  K:\n\
    K,W,N,\n\
    AA4DD<36.4/82.3>;\n";

    #[test]
    fn longitude_sign_convention_is_flipped() {
        let entries = parse_cty(SAMPLE);
        let monaco = &entries[0];
        assert_eq!(monaco.prefix, "3A");
        assert_eq!(monaco.lat, 43.73);
        assert_eq!(monaco.lng, -7.40);
        assert_eq!(monaco.dxcc, "260");
    }

    #[test]
    fn prefix_overrides_replace_coordinates() {
        let entries = parse_cty(SAMPLE);
        let over = entries.iter().find(|e| e.prefix == "AA4DD").unwrap();
        assert_eq!(over.lat, 36.4);
        assert_eq!(over.lng, -82.3);
        assert_eq!(over.dxcc, "291");
        // plain prefixes inherit the entity coordinates
        let k = entries.iter().find(|e| e.prefix == "K").unwrap();
        assert_eq!(k.lng, -91.67);
    }

    #[test]
    fn output_rows_are_fixed_width() {
        let entries = parse_cty(SAMPLE);
        let body = format_entries(&entries[..1], "Sat Aug 01 12:00:00 2026");
        let row = body.lines().nth(2).unwrap();
        assert_eq!(row, "3A             43.73   -7.40  260");
    }
}
