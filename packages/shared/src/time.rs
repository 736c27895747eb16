//! Wall-clock helpers for displaying chat lines.

use chrono::{Local, TimeZone};

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as a local `HH:MM:SS` clock.
///
/// Out-of-range timestamps fall back to `--:--:--`.
pub fn format_clock(timestamp_millis: i64) -> String {
    format_clock_in(&Local, timestamp_millis)
}

fn format_clock_in<Tz: TimeZone>(tz: &Tz, timestamp_millis: i64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(timestamp_millis).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
