use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%m/%d/%Y"];

/// Parse the date shapes browsers and the Creator platform produce.
///
/// Offsets are respected only to pick the wall-clock date; no timezone
/// conversion happens.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
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

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    parse_datetime(input).map(|dt| dt.date())
}

/// `DD-Mon-YYYY`, e.g. `05-Mar-2024`.
pub fn creator_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Parse then reformat; `None` for anything unparsable.
pub fn format_date(input: &str) -> Option<String> {
    parse_date(input).map(creator_date)
}

/// Two-decimal rendering used for money and percentages.
pub fn fixed2(value: f64) -> String {
    format!("{value:.2}")
}

/// Whole days from `start` to `end`, rounded up.
pub fn duration_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let secs = (end - start).num_seconds();
    let days = secs.div_euclid(86_400);
    if secs.rem_euclid(86_400) > 0 { days + 1 } else { days }
}
