//! The canonical "match week" boundary.
//!
//! Hattrick's competitive week runs Friday to Friday. Every consumer of that
//! boundary (the this-week match query, the played-this-period eligibility
//! check) goes through [`last_friday`] so there is exactly one definition:
//! the most recent Friday at 00:00:00 UTC, today included when today is a
//! Friday.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde_json::{Map, Value};

/// Most recent Friday at midnight UTC (today if today is Friday).
pub fn last_friday(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let days_back =
        (today.weekday().num_days_from_monday() + 7 - Weekday::Fri.num_days_from_monday()) % 7;
    let friday = today - Duration::days(i64::from(days_back));
    friday.and_time(NaiveTime::MIN).and_utc()
}

/// The current match period: `[last Friday, last Friday + 7 days)`.
pub fn current_period(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = last_friday(now);
    (start, start + Duration::days(7))
}

/// Whether the player behind this attribute bag already played an official
/// match in the current period.
///
/// Reads `LastMatch.Date` from the bag (CHPP's `"YYYY-MM-DD HH:MM:SS"`
/// shape, RFC3339 accepted too). Missing or unparseable data counts as
/// "has not played".
pub fn has_played_this_period(bag: &Map<String, Value>, now: DateTime<Utc>) -> bool {
    let Some(date) = bag
        .get("LastMatch")
        .and_then(Value::as_object)
        .and_then(|last_match| last_match.get("Date"))
        .and_then(Value::as_str)
        .and_then(parse_chpp_datetime)
    else {
        return false;
    };
    let (start, end) = current_period(now);
    start <= date && date < end
}

/// CHPP timestamps are naive local-format strings; they are treated as UTC.
fn parse_chpp_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
