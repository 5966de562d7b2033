/// Date handling for ticket cells: parsing displayed dates into comparable
/// instants, picking the most recent one, and rendering it back.
use crate::error::ArchiveError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

fn iso8601_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2}(?:\.\d+)?)(Z|[+-]\d{2}:\d{2})?$")
            .expect("ISO-8601 pattern is valid")
    })
}

/// Normalize a displayed date into milliseconds since the epoch, using the
/// viewer's local calendar for dates that carry no offset.
///
/// Accepted shapes:
/// - ISO-8601 date-time, e.g. `2024-03-15T09:05:00Z` or `2024-03-15T09:05:00`
/// - short `dd/mm/yy hh:mm`, e.g. `15/03/24 09:05` (year prefixed with `20`)
///
/// Empty input means "no date" and maps to `0`.
pub fn normalize_timestamp(text: &str) -> Result<i64, ArchiveError> {
    normalize_timestamp_in(text, &Local)
}

/// Same as [`normalize_timestamp`], with an explicit zone for offset-less dates
pub fn normalize_timestamp_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<i64, ArchiveError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }

    if iso8601_pattern().is_match(text) {
        if let Some(millis) = parse_iso8601(text, tz) {
            return Ok(millis);
        }
    }

    parse_short(text, tz).ok_or_else(|| ArchiveError::InvalidTimestamp {
        input: text.to_string(),
    })
}

fn parse_iso8601<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<i64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.timestamp_millis());
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    local_millis(&naive, tz)
}

/// `dd/mm/yy hh:mm`
fn parse_short<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<i64> {
    let parts: Vec<&str> = text.split(['/', ' ', ':']).collect();
    if parts.len() != 5 {
        return None;
    }

    // Day, month, hour and minute take one or two digits, the year exactly two
    let day = digits(parts[0], 1..=2)?;
    let month = digits(parts[1], 1..=2)?;
    let year = 2000 + digits(parts[2], 2..=2)? as i32;
    let hour = digits(parts[3], 1..=2)?;
    let minute = digits(parts[4], 1..=2)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    local_millis(&naive, tz)
}

fn digits(field: &str, len: RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&field.len()) || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn local_millis<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<i64> {
    // Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant.
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Most recent of the candidate instants, ignoring `0` ("no date")
pub fn most_recent(candidates: &[i64]) -> Option<i64> {
    candidates.iter().copied().filter(|ts| *ts != 0).max()
}

/// Most recent instant among displayed date values. Values that fail to
/// parse count as "no date".
pub fn latest_of<S: AsRef<str>>(values: &[S]) -> Option<i64> {
    let instants: Vec<i64> = values
        .iter()
        .map(|value| {
            normalize_timestamp(value.as_ref()).unwrap_or_else(|e| {
                log::debug!("{}", e);
                0
            })
        })
        .collect();
    most_recent(&instants)
}

const INTERVALS:[(&str, i64); 7] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Human phrase for the distance between `then_ms` and `now_ms`, keeping
/// the two largest non-zero units: "3 days and 2 hours ago".
pub fn relative_time(now_ms: i64, then_ms: i64) -> String {
    let mut remaining = (now_ms - then_ms).div_euclid(1000);
    let mut components: Vec<String> = Vec::new();

    for (label, seconds) in INTERVALS {
        if components.len() == 2 {
            break;
        }
        let count = remaining / seconds;
        if count > 0 {
            let plural = if count > 1 { "s" } else { "" };
            components.push(format!("{} {}{}", count, label, plural));
            remaining -= count * seconds;
        }
    }

    match components.as_slice() {
        [] => "just now".to_string(),
        [only] => format!("{} ago", only),
        [first, second] => format!("{} and {} ago", first, second),
        _ => unreachable!("at most two components are kept"),
    }
}

/// Absolute rendering of an instant in the viewer's zone, day first
pub fn format_instant(millis: i64) -> Option<String> {
    format_instant_in(millis, &Local)
}

pub fn format_instant_in<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%d/%m/%Y, %H:%M:%S").to_string())
}
