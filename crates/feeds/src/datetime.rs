//! Timestamp parsing for exchange notice boards.
//!
//! Korean exchanges print local time without an offset; such values are read as KST.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a notice timestamp such as `2024.01.15`, `2024-01-15 14:30:00`
/// or an RFC 3339 string. Returns None when nothing matches.
pub fn parse_exchange_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = normalize(s);

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return from_kst(naive);
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(from_kst)
}

/// Parse a Unix timestamp in milliseconds.
pub fn from_unix_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// `2024.01.15 14:30` -> `2024-01-15 14:30`, `2024-01-15T14:30:00` -> `2024-01-15 14:30:00`.
fn normalize(s: &str) -> String {
    let (date, time) = match s.find([' ', 'T']) {
        Some(idx) => (&s[..idx], s[idx + 1..].trim()),
        None => (s, ""),
    };

    let date = date.replace(['.', '/'], "-");
    let date = date.trim_end_matches('-');

    if time.is_empty() {
        date.to_string()
    } else {
        format!("{} {}", date, time)
    }
}

fn from_kst(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    FixedOffset::east_opt(KST_OFFSET_SECS)?
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dotted_date_is_kst_midnight() {
        let parsed = parse_exchange_datetime("2024.01.15").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 14, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_trailing_dot() {
        assert_eq!(
            parse_exchange_datetime("2024.01.15."),
            parse_exchange_datetime("2024-01-15")
        );
    }

    #[test]
    fn test_datetime_without_offset() {
        let parsed = parse_exchange_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());

        let parsed = parse_exchange_datetime("2024.01.15 14:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_iso_without_offset() {
        let parsed = parse_exchange_datetime("2024-01-15T14:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_keeps_offset() {
        let parsed = parse_exchange_datetime("2024-01-15T14:30:00+09:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());

        let parsed = parse_exchange_datetime("2024-01-15T05:30:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_exchange_datetime(""), None);
        assert_eq!(parse_exchange_datetime("어제"), None);
        assert_eq!(parse_exchange_datetime("2024.13.45"), None);
    }

    #[test]
    fn test_unix_millis() {
        let parsed = from_unix_millis(1_705_296_600_000).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());
    }
}
