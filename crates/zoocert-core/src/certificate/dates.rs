//! Tolerant date parsing for certificate validity fields.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref NUMERIC_DATE: Regex = Regex::new(
        r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2}):(\d{1,2})(?::(\d{1,2}))?)?"
    ).unwrap();
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date, falling back to the current local time.
pub fn parse_date(text: &str) -> NaiveDateTime {
    parse_date_at(text, Local::now().naive_local())
}

/// Parse a date, falling back to `now` when the text is empty or unparseable.
pub fn parse_date_at(text: &str, now: NaiveDateTime) -> NaiveDateTime {
    match try_parse_date(text) {
        Some(parsed) => parsed,
        None => {
            if !text.trim().is_empty() {
                warn!("Could not parse date {:?}, using current time", text);
            }
            now
        }
    }
}

/// Parse a date without any fallback.
pub fn try_parse_date(text: &str) -> Option<NaiveDateTime> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return None;
    }

    parse_generic(cleaned).or_else(|| {
        let parsed = parse_numeric(cleaned);
        if parsed.is_some() {
            debug!("Parsed date {:?} with numeric fallback", cleaned);
        }
        parsed
    })
}

fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_numeric(text: &str) -> Option<NaiveDateTime> {
    let caps = NUMERIC_DATE.captures(text)?;
    let number = |index: usize| -> Option<u32> {
        caps.get(index).map_or(Some(0), |m| m.as_str().parse().ok())
    };

    let year: i32 = caps[1].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)?;
    date.and_hms_opt(number(4)?, number(5)?, number(6)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_generic_formats() {
        assert_eq!(try_parse_date("2099-01-01 00:00:00"), Some(at(2099, 1, 1, 0, 0, 0)));
        assert_eq!(try_parse_date("2024-03-10T23:59:00"), Some(at(2024, 3, 10, 23, 59, 0)));
        assert_eq!(try_parse_date("2024-03-10"), Some(at(2024, 3, 10, 0, 0, 0)));
        assert_eq!(try_parse_date("15/03/2025 08:30"), Some(at(2025, 3, 15, 8, 30, 0)));
        assert_eq!(try_parse_date("15/03/2025"), Some(at(2025, 3, 15, 0, 0, 0)));
    }

    #[test]
    fn test_numeric_fallback_with_noise() {
        assert_eq!(
            try_parse_date("2024-3-9 7:05 HRS"),
            Some(at(2024, 3, 9, 7, 5, 0))
        );
        assert_eq!(try_parse_date("HASTA 2024-12-31"), Some(at(2024, 12, 31, 0, 0, 0)));
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert_eq!(try_parse_date("2024-02-30"), None);
        assert_eq!(try_parse_date("2024-01-01 25:00"), None);
    }

    #[test]
    fn test_fallback_to_now() {
        let now = at(2024, 6, 1, 12, 0, 0);
        assert_eq!(parse_date_at("", now), now);
        assert_eq!(parse_date_at("not a date", now), now);
    }

    #[test]
    fn test_fallback_uses_current_time() {
        for text in ["", "not a date"] {
            let parsed = parse_date(text);
            let drift = (Local::now().naive_local() - parsed).abs();
            assert!(drift < Duration::seconds(5), "{:?} drifted {:?}", text, drift);
        }
    }
}
