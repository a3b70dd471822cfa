//! Contest calendar from the weekly RSS feed.
//!
//! Date extraction runs three fallbacks in order: an explicit
//! `HHMMZ, Mon D to HHMMZ, Mon D` range, a single-day
//! `HHMMZ-HHMMZ, Mon D` window, and finally the first `Mon D` pair in
//! the text treated as a full-day event. Events are filtered to those
//! starting within the next 10 days.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hamclock_common::{fsio, ArtifactLayout, FetchResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use tracing::info;

use crate::client::get_text;

const CONTEST_RSS_URL: &str = "https://www.contestcalendar.com/calendar.rss";

const LOOKAHEAD_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Contest {
    pub start_uts: i64,
    pub end_uts: i64,
    pub title: String,
}

/// One RSS item as (title, description text).
pub fn parse_rss_items(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut field: Option<&'static str> = None;
    let mut title = String::new();
    let mut description = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    title.clear();
                    description.clear();
                }
                b"title" if in_item => field = Some("title"),
                b"description" if in_item => field = Some("description"),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    match field {
                        Some("title") => title.push_str(&text),
                        Some("description") => description.push_str(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t).to_string();
                match field {
                    Some("title") => title.push_str(&text),
                    Some("description") => description.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = false;
                    if !title.is_empty() {
                        items.push((title.clone(), description.clone()));
                    }
                }
                b"title" | b"description" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    items
}

fn month_number(abbr: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(abbr)).map(|i| i as u32 + 1)
}

/// Resolve a month/day near `now`, rolling into the next year across the
/// December/January boundary.
fn resolve_date(month: u32, day: u32, now: DateTime<Utc>) -> Option<NaiveDate> {
    let mut year = now.year();
    if month < now.month() && now.month() - month > 6 {
        year += 1;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn stamp(date: NaiveDate, hhmm: u32) -> i64 {
    let secs = (hhmm / 100) as i64 * 3600 + (hhmm % 100) as i64 * 60;
    date.and_hms_opt(0, 0, 0).expect("midnight").and_utc().timestamp() + secs
}

/// Extract the event window from an item's text.
pub fn extract_window(text: &str, now: DateTime<Utc>) -> Option<(i64, i64)> {
    let range = Regex::new(
        r"(\d{3,4})Z,?\s+(\w{3})\s+(\d{1,2})\s+to\s+(\d{3,4})Z,?\s+(\w{3})\s+(\d{1,2})",
    )
    .expect("static regex");
    if let Some(c) = range.captures(text) {
        let start = resolve_date(month_number(&c[2])?, c[3].parse().ok()?, now)?;
        let end = resolve_date(month_number(&c[5])?, c[6].parse().ok()?, now)?;
        return Some((stamp(start, c[1].parse().ok()?), stamp(end, c[4].parse().ok()?)));
    }

    let single = Regex::new(r"(\d{3,4})Z-(\d{3,4})Z,\s+(\w{3})\s+(\d{1,2})").expect("static regex");
    if let Some(c) = single.captures(text) {
        let day = resolve_date(month_number(&c[3])?, c[4].parse().ok()?, now)?;
        return Some((stamp(day, c[1].parse().ok()?), stamp(day, c[2].parse().ok()?)));
    }

    // Heuristic: any month-day mention becomes a full-day event.
    let loose = Regex::new(r"\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\w*\s+(\d{1,2})\b")
        .expect("static regex");
    if let Some(c) = loose.captures(text) {
        let day = resolve_date(month_number(&c[1])?, c[2].parse().ok()?, now)?;
        return Some((stamp(day, 0), stamp(day, 2359)));
    }
    None
}

/// Items -> contests starting within the lookahead window.
pub fn upcoming_contests(items: &[(String, String)], now: DateTime<Utc>) -> Vec<Contest> {
    let horizon = now.timestamp() + LOOKAHEAD_DAYS * 86400;
    let recent = now.timestamp() - 86400;

    let mut contests: Vec<Contest> = items
        .iter()
        .filter_map(|(title, description)| {
            let text = format!("{title} {description}");
            let (start_uts, end_uts) = extract_window(&text, now)?;
            if start_uts < recent || start_uts > horizon {
                return None;
            }
            Some(Contest { start_uts, end_uts, title: title.clone() })
        })
        .collect();
    contests.sort_by_key(|c| c.start_uts);
    contests
}

pub fn format_contests(contests: &[Contest]) -> String {
    let mut out = String::from("# start end title\n");
    for c in contests {
        out.push_str(&format!("{} {} {}\n", c.start_uts, c.end_uts, c.title));
    }
    out
}

pub async fn refresh(client: &Client, layout: &ArtifactLayout) -> FetchResult<()> {
    let xml = get_text(client, CONTEST_RSS_URL, Duration::from_secs(15)).await?;
    let items = parse_rss_items(&xml);
    let contests = upcoming_contests(&items, Utc::now());
    fsio::write_atomic(&layout.contests(), format_contests(&contests).as_bytes())?;

    info!(items = items.len(), upcoming = contests.len(), "contest calendar updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn range_format_wins() {
        let now = at(2026, 7, 30);
        let (start, end) =
            extract_window("1200Z, Aug 1 to 1159Z, Aug 3", now).unwrap();
        assert_eq!(end - start, 2 * 86400 - 60);
        assert_eq!(start, at(2026, 8, 1).timestamp() + 12 * 3600);
    }

    #[test]
    fn single_day_format() {
        let now = at(2026, 7, 30);
        let (start, end) = extract_window("0000Z-2359Z, Aug 2", now).unwrap();
        assert_eq!(start, at(2026, 8, 2).timestamp());
        assert_eq!(end - start, 23 * 3600 + 59 * 60);
    }

    #[test]
    fn heuristic_fallback_full_day() {
        let now = at(2026, 7, 30);
        let (start, end) = extract_window("Sprint weekend August 2 rules at ...", now).unwrap();
        assert_eq!(start, at(2026, 8, 2).timestamp());
        assert!(end > start);
    }

    #[test]
    fn filter_keeps_next_ten_days_only() {
        let now = at(2026, 7, 30);
        let items = vec![
            ("Near Contest".to_string(), "0000Z-2359Z, Aug 2".to_string()),
            ("Far Contest".to_string(), "0000Z-2359Z, Sep 20".to_string()),
        ];
        let contests = upcoming_contests(&items, now);
        assert_eq!(contests.len(), 1);
        assert_eq!(contests[0].title, "Near Contest");
    }

    #[test]
    fn rss_items_parse_with_cdata() {
        let xml = r#"<?xml version="1.0"?><rss><channel>
            <title>Calendar</title>
            <item><title>CQ Test</title><description><![CDATA[1200Z, Aug 1 to 1159Z, Aug 3]]></description></item>
        </channel></rss>"#;
        let items = parse_rss_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, "CQ Test");
        assert!(items[0].1.contains("Aug 1"));
    }
}
