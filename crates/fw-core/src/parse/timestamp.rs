//! Timestamp extraction for date-range filtering.

use chrono::{Datelike, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Syslog style: "Jan 12 09:23:45 host ...". The year is not on the line;
// it defaults to the current calendar year.
static SYSLOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<mon>[A-Za-z]{3})\s+(?P<day>\d{1,2})\s+(?P<time>\d{2}:\d{2}:\d{2})\s")
        .unwrap()
});

// ISO style: "2025-09-17T09:23:45" or "2025-09-17 09:23:45".
static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<date>\d{4}-\d{2}-\d{2})[T ](?P<time>\d{2}:\d{2}:\d{2})").unwrap());

/// Tries the two supported timestamp grammars in order.
///
/// Returns `None` when neither matches; lines without a timestamp are
/// never excluded by a date filter, so this is not an error.
pub fn extract_timestamp(line: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = SYSLOG_RE.captures(line) {
        let year = Local::now().year();
        let composed = format!("{} {} {} {}", &caps["mon"], &caps["day"], year, &caps["time"]);
        if let Ok(ts) = NaiveDateTime::parse_from_str(&composed, "%b %d %Y %H:%M:%S") {
            return Some(ts);
        }
    }

    if let Some(caps) = ISO_RE.captures(line) {
        let composed = format!("{} {}", &caps["date"], &caps["time"]);
        if let Ok(ts) = NaiveDateTime::parse_from_str(&composed, "%Y-%m-%d %H:%M:%S") {
            return Some(ts);
        }
    }

    None
}
