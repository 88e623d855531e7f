//! Wall-clock timestamp parsing for trip exports.
//!
//! Bike share exports have changed formats over the years (`2015-01-01
//! 00:21:44`, `2024-03-01 08:15:23.412`, `3/1/2024 08:15`, ISO 8601 with a
//! `T` separator, RFC 3339 with an offset). Only the wall-clock reading
//! matters downstream, so an explicit offset is dropped rather than applied.

use chrono::{DateTime, NaiveDateTime};

/// Formats tried in order before falling back to RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a trip timestamp into its local wall-clock date and time.
///
/// Surrounding whitespace and double quotes are ignored.
#[must_use]
pub fn parse_wall_clock(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local())
}
