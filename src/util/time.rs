use chrono::{DateTime, Days, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*(d|days?|w|weeks?|mo|months?)(?:\s+ago)?$").expect("static regex")
});

// Absolute forms seen on listing cards, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y", "%Y/%m/%d"];

/// Parse a card's posted-date text into a calendar date.
/// Relative forms ("today", "3 days ago", "2w") are resolved against `today`.
/// Returns None if unparseable.
pub fn parse_date_text(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    parse_relative(&s.to_lowercase(), today)
}

fn parse_relative(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" | "just now" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }
    let caps = RELATIVE_AGO.captures(s)?;
    let n: u32 = caps[1].parse().ok()?;
    match &caps[2] {
        "d" | "day" | "days" => today.checked_sub_days(Days::new(n as u64)),
        "w" | "week" | "weeks" => today.checked_sub_days(Days::new(n as u64 * 7)),
        _ => today.checked_sub_months(Months::new(n)),
    }
}

/// Parse an ISO 8601 date or date-time as accepted by the create/update API.
pub fn parse_iso8601_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn absolute_formats() {
        let today = d(2024, 3, 1);
        assert_eq!(parse_date_text("2024-01-05", today), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("Jan 5, 2024", today), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("January 05, 2024", today), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("5 Jan 2024", today), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T10:30:00Z", today), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("Fri, 05 Jan 2024 10:30:00 +0000", today), Some(d(2024, 1, 5)));
    }

    #[test]
    fn relative_formats() {
        let today = d(2024, 3, 10);
        assert_eq!(parse_date_text("Today", today), Some(today));
        assert_eq!(parse_date_text("yesterday", today), Some(d(2024, 3, 9)));
        assert_eq!(parse_date_text("3 days ago", today), Some(d(2024, 3, 7)));
        assert_eq!(parse_date_text("1 day ago", today), Some(d(2024, 3, 9)));
        assert_eq!(parse_date_text("2w", today), Some(d(2024, 2, 25)));
        assert_eq!(parse_date_text("1 month ago", today), Some(d(2024, 2, 10)));
        assert_eq!(parse_date_text("4d", today), Some(d(2024, 3, 6)));
    }

    #[test]
    fn unparseable_is_none() {
        let today = d(2024, 3, 10);
        assert_eq!(parse_date_text("N/A", today), None);
        assert_eq!(parse_date_text("", today), None);
        assert_eq!(parse_date_text("2024-13-45", today), None);
        assert_eq!(parse_date_text("some days ago", today), None);
    }

    #[test]
    fn iso_api_dates() {
        assert_eq!(parse_iso8601_date("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_iso8601_date("2024-01-05T00:00:00.000Z"), Some(d(2024, 1, 5)));
        assert_eq!(parse_iso8601_date("Jan 5, 2024"), None);
    }
}
