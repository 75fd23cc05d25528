//! RFC3339 timestamp helpers.
//!
//! Every persisted timestamp is RFC3339 UTC with millisecond precision
//! ("2026-08-07T09:30:00.000Z"). The fixed width keeps lexicographic TEXT
//! comparison equal to chronological order, which the match and snapshot
//! queries rely on.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC instant as RFC3339 with milliseconds and a `Z` suffix.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC3339 timestamp (any offset) into UTC.
pub fn parse_rfc3339_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad rfc3339: {s}"))?;
    Ok(dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_and_parse_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 7, 9, 30, 0).unwrap();
        let text = to_rfc3339_millis(dt);
        assert_eq!(text, "2026-08-07T09:30:00.000Z");
        assert_eq!(parse_rfc3339_utc(&text).unwrap(), dt);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_rfc3339_utc("2026-08-07T11:30:00+02:00").unwrap();
        assert_eq!(to_rfc3339_millis(parsed), "2026-08-07T09:30:00.000Z");
    }

    #[test]
    fn text_ordering_matches_chronology() {
        let earlier = to_rfc3339_millis(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
        let later = to_rfc3339_millis(Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert!(parse_rfc3339_utc("next friday").is_err());
    }
}
