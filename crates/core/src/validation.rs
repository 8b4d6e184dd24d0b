//! Input validation utilities.
//!
//! Date/time input reaches the core as raw text from the calling layer
//! (HTML form fields, imports). Parsing is lenient about the separator and
//! about missing time-of-day, strict about everything else.

use chrono::{NaiveDate, NaiveDateTime};

/// Formats accepted for an instant, tried in order.
const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses caller-supplied date/time text.
///
/// Accepts `YYYY-MM-DD` with an optional time of day, separated by a space
/// or a `T`. A bare date means midnight. Returns `None` when nothing
/// matches; the caller owns the error message.
pub fn parse_datetime_input(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses caller-supplied civil-date text (`YYYY-MM-DD`).
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Pushes a message unless `id` looks like a selected row reference.
///
/// Web forms post `0` for "nothing selected", so zero and negatives are
/// both treated as missing.
pub fn require_selected(errors: &mut Vec<String>, id: i64, field: &str) {
    if id <= 0 {
        errors.push(format!("a {field} must be selected"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_accepts_common_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime_input("2024-01-01 10:30:00"), Some(expected));
        assert_eq!(parse_datetime_input("2024-01-01T10:30"), Some(expected));
        assert_eq!(parse_datetime_input(" 2024-01-01 10:30 "), Some(expected));
    }

    #[test]
    fn test_parse_datetime_accepts_bare_date_as_midnight() {
        let parsed = parse_datetime_input("2024-01-01").expect("bare date should parse");
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert_eq!(parse_datetime_input(""), None);
        assert_eq!(parse_datetime_input("yesterday"), None);
        assert_eq!(parse_datetime_input("01/02/2024"), None);
        assert_eq!(parse_datetime_input("2024-13-40"), None);
    }

    #[test]
    fn test_require_selected_flags_zero_and_negative() {
        let mut errors = Vec::new();
        require_selected(&mut errors, 0, "patient");
        require_selected(&mut errors, -3, "room");
        require_selected(&mut errors, 7, "bed");
        assert_eq!(
            errors,
            vec![
                "a patient must be selected".to_owned(),
                "a room must be selected".to_owned()
            ]
        );
    }
}
