//! Timestamp parsing for sample time columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
];

/// Parse an ISO-8601 style timestamp, treating zone-less values as UTC.
///
/// Bare numbers are never timestamps: a plain coordinate column must not be
/// mistaken for a time column.
pub fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    let token = token.trim();
    if token.is_empty() || token.parse::<f64>().is_ok() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = token.strip_suffix('Z').unwrap_or(token);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn numeric_tokens_never_parse_as_times(v in any::<f64>()) {
            prop_assert!(parse_timestamp(&v.to_string()).is_none());
            let sci = format!("{v:e}");
            prop_assert!(parse_timestamp(&sci).is_none());
        }

        #[test]
        fn whole_second_times_round_trip(secs in 0i64..4_000_000_000) {
            let expected = Utc.timestamp_opt(secs, 0).unwrap();
            let text = expected.format("%Y-%m-%dT%H:%M:%S").to_string();
            prop_assert_eq!(parse_timestamp(&text), Some(expected));
        }
    }
}
