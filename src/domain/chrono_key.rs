//! Sortable keys for event dates.
//!
//! Dates come in two shapes: ordinary calendar dates (`2020-01-01`) and the
//! in-world calendar notation `<year>Y <month>M [<day>]<marker>`, where the
//! marker names a reference point inside the month. Both decode into a
//! [`ChronoKey`] so events of either shape can be ordered together.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::trace;

use crate::domain::error::ChronoDecodeError;

/// Ordering key of an event.
///
/// For custom calendar dates `day` is a countdown-style proxy derived from the
/// marker, not a day of the month; only its ordering is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChronoKey {
    pub year: i64,
    pub month: i64,
    pub day: i64,
}

impl ChronoKey {
    pub const fn new(year: i64, month: i64, day: i64) -> Self {
        Self { year, month, day }
    }
}

impl From<(i64, i64, i64)> for ChronoKey {
    fn from((year, month, day): (i64, i64, i64)) -> Self {
        Self::new(year, month, day)
    }
}

impl fmt::Display for ChronoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.year, self.month, self.day)
    }
}

/// Reference points of the in-world calendar and their day offsets.
const MARKERS: [(&str, i64); 4] = [("KAL", 1), ("IDE", 20), ("NON", 28), ("X", 2)];

/// Token appended so that month and day/marker positions always exist.
const FILLER: &str = "0KAL";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Decode an event date into its ordering key.
pub fn decode(date: &str) -> Result<ChronoKey, ChronoDecodeError> {
    if let Some(parsed) = parse_standard_date(date) {
        trace!("'{}' parsed as standard date {}", date, parsed);
        return Ok(ChronoKey::new(
            i64::from(parsed.year()),
            i64::from(parsed.month()),
            i64::from(parsed.day()),
        ));
    }
    decode_calendar(date)
}

/// Strict parse against a fixed list of unambiguous formats.
pub fn parse_standard_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        })
}

/// Decode the in-world calendar notation.
pub fn decode_calendar(date: &str) -> Result<ChronoKey, ChronoDecodeError> {
    let mut tokens = tokenize(date);
    tokens.extend(std::iter::repeat(FILLER.to_string()).take(3));

    let year = parse_number(date, &tokens[0], |c| c.is_ascii_digit() || c == '-')?;
    let month = parse_number(date, &tokens[1], |c| c.is_ascii_digit())?;

    let day_token = tokens[2].as_str();
    let digits_end = day_token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(day_token.len());
    let day = day_token[..digits_end].parse::<i64>().unwrap_or(1);
    let marker = &day_token[digits_end..];

    let offset = MARKERS
        .iter()
        .find(|(name, _)| *name == marker)
        .map(|(_, offset)| *offset)
        .ok_or_else(|| ChronoDecodeError::UnknownMarker {
            date: date.to_string(),
            marker: marker.to_string(),
        })?;

    let day_proxy = (32 - offset - (day - 2)).rem_euclid(31);
    Ok(ChronoKey::new(year, month, day_proxy))
}

/// Split on whitespace, gluing a purely alphabetic unit or marker onto a
/// preceding numeral (`5 Y` reads as `5Y`, `15 IDE` as `15IDE`).
fn tokenize(date: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in date.split_whitespace() {
        let alphabetic = word.chars().all(|c| c.is_ascii_alphabetic());
        match tokens.last_mut() {
            Some(prev) if alphabetic && prev.ends_with(|c: char| c.is_ascii_digit()) => {
                prev.push_str(word)
            }
            _ => tokens.push(word.to_string()),
        }
    }
    tokens
}

fn parse_number(
    date: &str,
    token: &str,
    keep: impl Fn(char) -> bool,
) -> Result<i64, ChronoDecodeError> {
    let digits: String = token.chars().filter(|&c| keep(c)).collect();
    digits
        .parse::<i64>()
        .map_err(|_| ChronoDecodeError::MalformedNumber {
            date: date.to_string(),
            token: token.to_string(),
        })
}
