//! Metadata line of a clipping block.
//!
//! Example: `- Your Highlight on page 3 | location 40-41 | Added on Sunday, January 5, 2025 1:50:08 PM`

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use clip_core::entry::EntryKind;

/// Format of the "Added on" timestamp after its leading weekday (12-hour clock).
pub const TIMESTAMP_FORMAT: &str = "%B %d, %Y %I:%M:%S %p";

static PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)page\s+(\d+)").unwrap());
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)location\s+([\d-]+)").unwrap());
static ADDED_ON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Added on (.*)$").unwrap());

/// Fields extracted from a header line.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub kind: EntryKind,
    pub page: Option<u32>,
    pub location: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

/// Parse a header line. Returns `None` for anything that is neither a
/// highlight nor a note (bookmarks, clipped articles, garbage).
pub fn parse_header(line: &str) -> Option<Header> {
    let kind = if line.contains("Your Highlight") {
        EntryKind::Highlight
    } else if line.contains("Your Note") {
        EntryKind::Note
    } else {
        return None;
    };

    let page = PAGE_RE
        .captures(line)
        .and_then(|c| c[1].parse::<u32>().ok())
        .filter(|p| *p > 0);

    let location = LOCATION_RE.captures(line).map(|c| c[1].to_string());

    let timestamp = ADDED_ON_RE
        .captures(line)
        .and_then(|c| parse_timestamp(&c[1]));

    Some(Header {
        kind,
        page,
        location,
        timestamp,
    })
}

/// Parse an "Added on" value such as `Sunday, January 5, 2025 1:50:08 PM`.
///
/// The weekday must be a single word but is otherwise ignored; devices
/// sometimes write one that does not agree with the date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let date = match raw.split_once(", ") {
        Some((weekday, rest)) if !weekday.is_empty() && weekday.chars().all(char::is_alphabetic) => {
            rest.trim_start()
        }
        _ => {
            log::debug!("Timestamp {:?} does not start with a weekday", raw);
            return None;
        }
    };
    match NaiveDateTime::parse_from_str(date, TIMESTAMP_FORMAT) {
        Ok(ts) => Some(ts),
        Err(e) => {
            log::debug!("Unrecognised timestamp {:?}: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_highlight_header() {
        let header = parse_header(
            "- Your Highlight on page 3 | location 40-41 | Added on Monday, January 1, 2024 10:00:00 AM",
        )
        .unwrap();
        assert_eq!(header.kind, EntryKind::Highlight);
        assert_eq!(header.page, Some(3));
        assert_eq!(header.location.as_deref(), Some("40-41"));
        assert_eq!(
            header.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
        );
    }

    #[test]
    fn test_parse_note_header_without_page() {
        let header = parse_header(
            "- Your Note at location 112 | Added on Sunday, January 5, 2025 1:50:08 PM",
        )
        .unwrap();
        assert_eq!(header.kind, EntryKind::Note);
        assert_eq!(header.page, None);
        assert_eq!(header.location.as_deref(), Some("112"));
        assert_eq!(
            header.timestamp,
            NaiveDate::from_ymd_opt(2025, 1, 5)
                .unwrap()
                .and_hms_opt(13, 50, 8)
        );
    }

    #[test]
    fn test_kind_markers_are_case_sensitive() {
        assert!(parse_header("- your highlight on page 3").is_none());
        assert!(parse_header("- Your Bookmark on page 3 | Added on ...").is_none());
    }

    #[test]
    fn test_page_keyword_is_case_insensitive() {
        let header = parse_header("- Your Highlight on Page 12 | Added on x").unwrap();
        assert_eq!(header.page, Some(12));
        assert_eq!(header.timestamp, None);
    }

    #[test]
    fn test_page_zero_is_absent() {
        let header = parse_header("- Your Note on page 0").unwrap();
        assert_eq!(header.page, None);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert_eq!(
            parse_timestamp("Sunday, January 5, 2025 12:00:00 AM"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("Sunday, January 05, 2025 01:50:08 PM"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
                .unwrap()
                .and_hms_opt(13, 50, 8)
        );
        assert_eq!(parse_timestamp("2025-01-05 13:50:08"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_weekday_is_not_checked_against_date() {
        // 2024-01-01 was a Monday
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0);
        assert_eq!(parse_timestamp("Monday, January 1, 2024 10:00:00 AM"), expected);
        assert_eq!(parse_timestamp("Tuesday, January 1, 2024 10:00:00 AM"), expected);

        let header = parse_header(
            "- Your Note on page 2 | Added on Tuesday, January 1, 2024 10:00:00 AM",
        )
        .unwrap();
        assert_eq!(header.timestamp, expected);
    }

    #[test]
    fn test_weekday_must_be_a_single_word() {
        assert_eq!(parse_timestamp("January 1, 2024 10:00:00 AM"), None);
        assert_eq!(parse_timestamp("Mon day, January 1, 2024 10:00:00 AM"), None);
        assert_eq!(parse_timestamp(", January 1, 2024 10:00:00 AM"), None);
    }
}
