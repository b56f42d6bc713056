use chrono::{NaiveDate, NaiveDateTime};

// ── Day-first parsing ─────────────────────────────────────────────────────────

/// Timestamp formats tried in order. Day-first forms come first because that
/// is how the source logs are written; ISO forms follow for re-exported data.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Bare-date formats tried in order (CLI range bounds, date-only fields).
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Parse an event timestamp, day-first formats preferred.
///
/// A bare date parses to midnight of that day. Returns `None` for empty or
/// unrecognised input; callers decide whether that drops the row or only
/// warrants a log line.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a bare date, day-first formats preferred.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

// ── Durations ─────────────────────────────────────────────────────────────────

/// Stage duration in minutes with the clamp-to-zero policy: whenever
/// `end <= start` the result is 0.0, never negative.
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let minutes = (end - start).num_seconds() as f64 / 60.0;
    if minutes > 0.0 {
        minutes
    } else {
        0.0
    }
}

// ── Display helpers ───────────────────────────────────────────────────────────

/// Render a date in the day-first convention of the source logs.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Render a timestamp in the day-first convention of the source logs.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    // ── parse_timestamp ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_dotted_day_first() {
        assert_eq!(
            parse_timestamp("05.03.2024 09:30:15"),
            Some(ymd_hms(2024, 3, 5, 9, 30, 15))
        );
        assert_eq!(
            parse_timestamp("05.03.2024 09:30"),
            Some(ymd_hms(2024, 3, 5, 9, 30, 0))
        );
    }

    #[test]
    fn test_parse_slashed_day_first() {
        assert_eq!(
            parse_timestamp("05/03/2024 09:30:15"),
            Some(ymd_hms(2024, 3, 5, 9, 30, 15))
        );
    }

    #[test]
    fn test_parse_iso_forms() {
        assert_eq!(
            parse_timestamp("2024-03-05 09:30:15"),
            Some(ymd_hms(2024, 3, 5, 9, 30, 15))
        );
        assert_eq!(
            parse_timestamp("2024-03-05T09:30:15"),
            Some(ymd_hms(2024, 3, 5, 9, 30, 15))
        );
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        assert_eq!(
            parse_timestamp("05.03.2024"),
            Some(ymd_hms(2024, 3, 5, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_day_first_wins_over_month_first() {
        // 04.03 must read as 4 March, never 3 April.
        let parsed = parse_timestamp("04.03.2024 12:00").expect("parse");
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            parse_timestamp("  05.03.2024 09:30  "),
            Some(ymd_hms(2024, 3, 5, 9, 30, 0))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("soon"), None);
        assert_eq!(parse_timestamp("99.99.2024 09:00"), None);
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("05.03.2024"), Some(expected));
        assert_eq!(parse_date("05/03/2024"), Some(expected));
        assert_eq!(parse_date("2024-03-05"), Some(expected));
        assert_eq!(parse_date("March 5th"), None);
    }

    // ── duration_minutes ──────────────────────────────────────────────────────

    #[test]
    fn test_duration_positive() {
        let start = ymd_hms(2024, 3, 5, 9, 0, 0);
        let end = ymd_hms(2024, 3, 5, 9, 45, 0);
        assert!((duration_minutes(start, end) - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duration_fractional() {
        let start = ymd_hms(2024, 3, 5, 9, 0, 0);
        let end = ymd_hms(2024, 3, 5, 9, 1, 30);
        assert!((duration_minutes(start, end) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duration_zero_when_end_equals_start() {
        let t = ymd_hms(2024, 3, 5, 9, 0, 0);
        assert_eq!(duration_minutes(t, t), 0.0);
    }

    #[test]
    fn test_duration_clamps_negative_to_zero() {
        let start = ymd_hms(2024, 3, 5, 10, 0, 0);
        let end = ymd_hms(2024, 3, 5, 9, 0, 0);
        assert_eq!(duration_minutes(start, end), 0.0);
    }

    // ── display helpers ───────────────────────────────────────────────────────

    #[test]
    fn test_format_date_day_first() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(d), "05.03.2024");
    }

    #[test]
    fn test_format_timestamp_day_first() {
        let ts = ymd_hms(2024, 3, 5, 9, 30, 0);
        assert_eq!(format_timestamp(ts), "05.03.2024 09:30");
    }
}
