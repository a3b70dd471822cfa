//! DX-pedition announcements scraped from the NG3K ADXO table.

use std::time::Duration;

use chrono::NaiveDate;
use hamclock_common::{fsio, ArtifactLayout, FetchError, FetchResult};
use regex::Regex;
use reqwest::Client;
use tracing::info;

use crate::client::BROWSER_UA;

const ADXO_URL: &str = "https://www.ng3k.com/Misc/adxo.html";

/// One announced operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Dxpedition {
    pub start_uts: i64,
    pub end_uts: i64,
    pub entity: String,
    pub call: String,
    pub url: String,
}

/// `2026 Jan01` -> midnight UTC unix time.
pub fn parse_adxo_date(raw: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y %b%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn strip_tags(html: &str) -> String {
    let tags = Regex::new(r"(?s)<[^>]*>").expect("static regex");
    tags.replace_all(html, "").trim().to_string()
}

/// Scrape the announcement rows out of the HTML table.
pub fn parse_adxo(html: &str) -> Vec<Dxpedition> {
    let row_re = Regex::new(r#"(?s)<tr class="adxoitem"[^>]*>(.*?)</tr>"#).expect("static regex");
    let col_re = Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("static regex");
    let call_re = Regex::new(r#"(?s)<span class="call">(.*?)</span>"#).expect("static regex");
    let href_re = Regex::new(r#"href="([^"]*)""#).expect("static regex");

    let mut results = Vec::new();
    for row in row_re.captures_iter(html) {
        let row_html = &row[1];
        let cols: Vec<String> = col_re
            .captures_iter(row_html)
            .map(|c| c[1].to_string())
            .collect();
        if cols.len() < 4 {
            continue;
        }

        let start = parse_adxo_date(&strip_tags(&cols[0]));
        let end = parse_adxo_date(&strip_tags(&cols[1]));
        let entity = strip_tags(&cols[2]);
        let call = match call_re.captures(&cols[3]) {
            Some(c) => strip_tags(&c[1]),
            None => strip_tags(&cols[3]),
        };

        let mut url = href_re
            .captures(row_html)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| ADXO_URL.to_string());
        if url.starts_with('/') {
            url = format!("https://www.ng3k.com{url}");
        }

        if let (Some(start_uts), Some(end_uts)) = (start, end) {
            results.push(Dxpedition { start_uts, end_uts, entity, call, url });
        }
    }
    results
}

/// Render the artifact: a source-count header followed by one CSV row per
/// operation.
pub fn format_dxpeds(peds: &[Dxpedition]) -> String {
    let mut out = format!("1\nNG3K\n{ADXO_URL}\n");
    for p in peds {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            p.start_uts, p.end_uts, p.entity, p.call, p.url
        ));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let resp = client
        .get(ADXO_URL)
        .header(reqwest::header::USER_AGENT, BROWSER_UA)
        .timeout(Duration::from_secs(15))
        .send()
        .await
        .map_err(crate::client::map_reqwest)?;
    if !resp.status().is_success() {
        return Err(FetchError::HttpStatus(resp.status().as_u16()));
    }
    let html = resp.text().await.map_err(crate::client::map_reqwest)?;

    let peds = parse_adxo(&html);
    fsio::write_atomic(&layout.dxpeds(), format_dxpeds(&peds).as_bytes())?;

    info!(operations = peds.len(), "dxpeditions updated");
    Ok(())
}
