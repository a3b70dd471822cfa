//! PSKReporter reception reports.
//!
//! The query family decides the orientation of the emitted CSV: `by*`
//! parameters name the client as the sender (DE = sender of the report),
//! `of*` parameters name it as the receiver (DE = receiver).

use std::time::Duration;

use hamclock_common::{FetchError, FetchResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, warn};

use crate::client::map_reqwest;

const PSK_URL: &str = "https://retrieve.pskreporter.info/query";

/// What the client identified itself by.
#[derive(Debug, Clone)]
pub enum SpotTarget {
    Callsign(String),
    Grid(String),
}

#[derive(Debug, Clone)]
pub struct SpotQuery {
    pub target: SpotTarget,
    /// True when the client is the receiver of the reports (`of*`).
    pub is_receiver: bool,
    pub maxage_sec: u32,
}

/// One reception report as parsed from the XML attributes.
#[derive(Debug, Default, Clone)]
pub struct Report {
    pub sender_call: String,
    pub sender_grid: String,
    pub receiver_call: String,
    pub receiver_grid: String,
    pub frequency: String,
    pub mode: String,
    pub snr: String,
    pub flow_start: String,
}

/// Pull every `receptionReport` element out of the response document.
pub fn parse_reports(xml: &str) -> Vec<Report> {
    let mut reader = Reader::from_str(xml);
    let mut reports = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(e) => e,
            Err(_) => break,
        };
        let element = match &event {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"receptionReport" => e,
            Event::Eof => break,
            _ => continue,
        };

        let mut report = Report::default();
        for attr in element.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value).to_string();
            match attr.key.as_ref() {
                b"senderCallsign" => report.sender_call = value,
                b"senderLocator" => report.sender_grid = value,
                b"receiverCallsign" => report.receiver_call = value,
                b"receiverLocator" => report.receiver_grid = value,
                b"frequency" => report.frequency = value,
                b"mode" => report.mode = value,
                b"sNR" => report.snr = value,
                b"flowStartSeconds" => report.flow_start = value,
                _ => {}
            }
        }
        reports.push(report);
    }
    reports
}

/// Render the client CSV:
/// `posting_time,de_grid,de_call,dx_grid,dx_call,mode,hz,snr`.
pub fn format_spots(reports: &[Report], is_receiver: bool) -> String {
    let lines: Vec<String> = reports
        .iter()
        .map(|r| {
            if is_receiver {
                format!(
                    "{},{},{},{},{},{},{},{}",
                    r.flow_start,
                    r.receiver_grid,
                    r.receiver_call,
                    r.sender_grid,
                    r.sender_call,
                    r.mode,
                    r.frequency,
                    r.snr
                )
            } else {
                format!(
                    "{},{},{},{},{},{},{},{}",
                    r.flow_start,
                    r.sender_grid,
                    r.sender_call,
                    r.receiver_grid,
                    r.receiver_call,
                    r.mode,
                    r.frequency,
                    r.snr
                )
            }
        })
        .collect();
    lines.join("\n")
}

/// Query PSKReporter and emit the oriented CSV.
pub async fn fetch_spots(client: &Client, query: &SpotQuery) -> FetchResult<String> {
    let mut params: Vec<(String, String)> = vec![
        ("flowStartSeconds".into(), format!("-{}", query.maxage_sec)),
        ("no_antennas".into(), "1".into()),
    ];
    match &query.target {
        SpotTarget::Callsign(call) => {
            let key = if query.is_receiver { "receiverCallsign" } else { "senderCallsign" };
            params.push((key.into(), call.clone()));
        }
        SpotTarget::Grid(grid) => {
            params.push(("receiverGridSquare".into(), grid.clone()));
        }
    }

    // The service sheds load with 503s; one short retry usually lands.
    let mut attempt = 0;
    loop {
        let resp = client
            .get(PSK_URL)
            .query(&params)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(map_reqwest)?;

        if resp.status().as_u16() == 503 && attempt < 2 {
            attempt += 1;
            warn!(attempt, "spot service busy, retrying");
            tokio::time::sleep(Duration::from_secs(2)).await;
            continue;
        }
        if !resp.status().is_success() {
            return Err(FetchError::HttpStatus(resp.status().as_u16()));
        }

        let xml = resp.text().await.map_err(map_reqwest)?;
        let reports = parse_reports(&xml);
        debug!(count = reports.len(), "reception reports");
        return Ok(format_spots(&reports, query.is_receiver));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0"?>
<receptionReports currentSeconds="1769949000">
  <receptionReport receiverCallsign="W1AW" receiverLocator="FN31pr"
      senderCallsign="VK3ABC" senderLocator="QF22lb" frequency="14074123"
      mode="FT8" sNR="-12" flowStartSeconds="1769948000"/>
</receptionReports>"#;

    #[test]
    fn parses_report_attributes() {
        let reports = parse_reports(XML);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].sender_call, "VK3ABC");
        assert_eq!(reports[0].receiver_grid, "FN31pr");
        assert_eq!(reports[0].snr, "-12");
    }

    #[test]
    fn by_query_puts_sender_as_de() {
        let reports = parse_reports(XML);
        let csv = format_spots(&reports, false);
        assert_eq!(csv, "1769948000,QF22lb,VK3ABC,FN31pr,W1AW,FT8,14074123,-12");
    }

    #[test]
    fn of_query_swaps_de_and_dx() {
        let reports = parse_reports(XML);
        let csv = format_spots(&reports, true);
        assert_eq!(csv, "1769948000,FN31pr,W1AW,QF22lb,VK3ABC,FT8,14074123,-12");
    }
}
