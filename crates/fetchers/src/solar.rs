//! Daily solar indices: sunspot number and 10.7 cm flux.
//!
//! One upstream text feed produces two artifacts: `ssn/ssn-31.txt`
//! (31 daily rows `YYYY MM DD SSN`) and `solar-flux/solarflux-99.txt`
//! (99 values, each daily flux replicated three times).

use std::time::Duration;

use hamclock_common::series::fit_window;
use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use reqwest::Client;
use tracing::info;

use crate::client::get_text;

const SOLAR_INDICES_URL: &str = "https://services.swpc.noaa.gov/text/daily-solar-indices.txt";

const SSN_WINDOW: usize = 31;
const FLUX_WINDOW: usize = 99;

/// Parse the whitespace-aligned daily indices feed into
/// (ssn records, flux values).
pub fn parse_solar_indices(text: &str) -> (Vec<String>, Vec<String>) {
    let mut ssn_records = Vec::new();
    let mut flux_records = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        let (year, month, day, flux, ssn) = (parts[0], parts[1], parts[2], parts[3], parts[4]);
        ssn_records.push(format!("{year} {month:0>2} {day:0>2} {ssn}"));
        // Three flux samples per day fill the 99-value window over 33 days.
        for _ in 0..3 {
            flux_records.push(flux.to_string());
        }
    }

    (ssn_records, flux_records)
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let text = get_text(client, SOLAR_INDICES_URL, Duration::from_secs(10)).await?;
    let (ssn_records, flux_records) = parse_solar_indices(&text);

    let ssn = fit_window(&ssn_records, SSN_WINDOW, "0".to_string());
    let mut out = ssn.join("\n");
    out.push('\n');
    fsio::write_atomic(&layout.ssn(), out.as_bytes())?;

    let flux = fit_window(&flux_records, FLUX_WINDOW, "0".to_string());
    let mut out = flux.join("\n");
    out.push('\n');
    fsio::write_atomic(&layout.solar_flux(), out.as_bytes())?;

    info!(ssn = ssn.len(), flux = flux.len(), "solar indices updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
:Product: Daily Solar Data\n\
#  Yr Mo Da  Flux  SSN  ...\n\
2026 01 30  165   95   12  3  0  1  2  3\n\
2026 01 31  170  131   11  2  0  1  2  3\n";

    #[test]
    fn parses_records_and_replicates_flux() {
        let (ssn, flux) = parse_solar_indices(SAMPLE);
        assert_eq!(ssn, vec!["2026 01 30 95", "2026 01 31 131"]);
        assert_eq!(flux.len(), 6);
        assert_eq!(flux[0], "165");
        assert_eq!(flux[5], "170");
    }

    #[test]
    fn windows_have_canonical_lengths() {
        let (ssn, flux) = parse_solar_indices(SAMPLE);
        assert_eq!(fit_window(&ssn, SSN_WINDOW, "0".into()).len(), 31);
        assert_eq!(fit_window(&flux, FLUX_WINDOW, "0".into()).len(), 99);
    }
}
