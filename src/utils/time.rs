//! Relative-time and countdown formatting for dashboard views.
//!
//! All timestamps arriving from the server are ISO-8601 strings that may or
//! may not carry a timezone designator. These helpers never panic on
//! malformed input: a string that fails to parse is returned unchanged so a
//! bad timestamp degrades to showing the raw value instead of breaking a
//! render.

use chrono::{DateTime, Utc};

/// Negative elapsed time within this window is treated as "just now".
/// Absorbs small clock skew between the server and this machine.
const CLOCK_SKEW_TOLERANCE_SECS: i64 = 10;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86400;

/// Returns true if the timestamp already carries a timezone designator:
/// a trailing `Z`/`z` or a `±HH:MM` offset suffix.
fn has_timezone_suffix(iso: &str) -> bool {
    let bytes = iso.as_bytes();
    if matches!(bytes.last(), Some(b'Z') | Some(b'z')) {
        return true;
    }
    if bytes.len() < 6 {
        return false;
    }
    let tail = &bytes[bytes.len() - 6..];
    matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

/// Normalize an ISO-8601 timestamp for parsing: timestamps without timezone
/// info are assumed UTC and get a `Z` appended. Must be applied before any
/// parse to avoid local-timezone misinterpretation.
pub fn normalize_iso(iso: &str) -> String {
    if has_timezone_suffix(iso) {
        iso.to_string()
    } else {
        format!("{}Z", iso)
    }
}

fn parse_iso(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&normalize_iso(iso))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format an ISO-8601 timestamp as a relative "time ago" string.
///
/// Buckets into seconds/minutes/hours/days, always picking the largest unit
/// that is at least 1 (90 seconds is `1m ago`, not `90s ago`), flooring
/// throughout. Timestamps slightly in the future (clock skew) render as
/// `0s ago`; timestamps further in the future render as `in {N}s`.
pub fn time_ago(iso: &str) -> String {
    time_ago_at(iso, Utc::now())
}

/// `time_ago` against an explicit "now", for deterministic rendering.
pub fn time_ago_at(iso: &str, now: DateTime<Utc>) -> String {
    let Some(parsed) = parse_iso(iso) else {
        return iso.to_string();
    };

    let seconds = (now - parsed).num_seconds();
    if seconds < 0 {
        if seconds >= -CLOCK_SKEW_TOLERANCE_SECS {
            return "0s ago".to_string();
        }
        return format!("in {}s", -seconds);
    }

    if seconds < SECS_PER_MINUTE {
        return format!("{}s ago", seconds);
    }
    let minutes = seconds / SECS_PER_MINUTE;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Format an ISO-8601 timestamp as a countdown string.
///
/// Past timestamps render as `overdue`. Otherwise the remaining duration is
/// decomposed into days/hours/minutes/seconds and the non-zero components
/// are emitted largest-first, space-joined (`1d 2h 5m`). Seconds are always
/// included when no larger unit is non-zero, so the result is never empty
/// (`0s` for a timestamp exactly now).
pub fn time_until(iso: &str) -> String {
    time_until_at(iso, Utc::now())
}

/// `time_until` against an explicit "now", for deterministic rendering.
pub fn time_until_at(iso: &str, now: DateTime<Utc>) -> String {
    let Some(parsed) = parse_iso(iso) else {
        return iso.to_string();
    };

    let seconds = (parsed - now).num_seconds();
    if seconds < 0 {
        return "overdue".to_string();
    }

    let days = seconds / SECS_PER_DAY;
    let hours = (seconds % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn iso_offset(secs: i64) -> String {
        (fixed_now() + Duration::seconds(secs)).to_rfc3339()
    }

    #[test]
    fn test_normalize_iso_appends_z_when_naive() {
        assert_eq!(normalize_iso("2025-06-15T12:00:00"), "2025-06-15T12:00:00Z");
        assert_eq!(
            normalize_iso("2025-06-15T12:00:00.123"),
            "2025-06-15T12:00:00.123Z"
        );
    }

    #[test]
    fn test_normalize_iso_keeps_existing_timezone() {
        assert_eq!(
            normalize_iso("2025-06-15T12:00:00Z"),
            "2025-06-15T12:00:00Z"
        );
        assert_eq!(
            normalize_iso("2025-06-15T12:00:00z"),
            "2025-06-15T12:00:00z"
        );
        assert_eq!(
            normalize_iso("2025-06-15T12:00:00+02:00"),
            "2025-06-15T12:00:00+02:00"
        );
        assert_eq!(
            normalize_iso("2025-06-15T12:00:00-05:30"),
            "2025-06-15T12:00:00-05:30"
        );
    }

    #[test]
    fn test_time_ago_invalid_input_returned_unchanged() {
        assert_eq!(time_ago("not-a-date"), "not-a-date");
        assert_eq!(time_ago(""), "");
    }

    #[test]
    fn test_time_ago_bucket_boundaries() {
        let now = fixed_now();
        assert_eq!(time_ago_at(&iso_offset(-59), now), "59s ago");
        assert_eq!(time_ago_at(&iso_offset(-60), now), "1m ago");
        assert_eq!(time_ago_at(&iso_offset(-90), now), "1m ago");
        assert_eq!(time_ago_at(&iso_offset(-3599), now), "59m ago");
        assert_eq!(time_ago_at(&iso_offset(-3600), now), "1h ago");
        assert_eq!(time_ago_at(&iso_offset(-86399), now), "23h ago");
        assert_eq!(time_ago_at(&iso_offset(-86400), now), "1d ago");
        assert_eq!(time_ago_at(&iso_offset(-86400 * 3), now), "3d ago");
    }

    #[test]
    fn test_time_ago_clock_skew_tolerance() {
        let now = fixed_now();
        assert_eq!(time_ago_at(&iso_offset(5), now), "0s ago");
        assert_eq!(time_ago_at(&iso_offset(10), now), "0s ago");
        assert_eq!(time_ago_at(&iso_offset(30), now), "in 30s");
    }

    #[test]
    fn test_time_ago_naive_timestamp_assumed_utc() {
        let now = fixed_now();
        assert_eq!(time_ago_at("2025-06-15T11:59:00", now), "1m ago");
    }

    #[test]
    fn test_time_until_past_is_overdue() {
        let now = fixed_now();
        assert_eq!(time_until_at(&iso_offset(-1), now), "overdue");
        assert_eq!(time_until_at(&iso_offset(-86400), now), "overdue");
    }

    #[test]
    fn test_time_until_zero_seconds() {
        let now = fixed_now();
        assert_eq!(time_until_at(&iso_offset(0), now), "0s");
    }

    #[test]
    fn test_time_until_component_breakdown() {
        let now = fixed_now();
        // 3725s = 1h 2m 5s, no leading 0d
        assert_eq!(time_until_at(&iso_offset(3725), now), "1h 2m 5s");
        assert_eq!(time_until_at(&iso_offset(45), now), "45s");
        // Zero middle components are skipped
        assert_eq!(time_until_at(&iso_offset(3605), now), "1h 5s");
        assert_eq!(
            time_until_at(&iso_offset(86400 + 2 * 3600 + 5 * 60), now),
            "1d 2h 5m"
        );
    }

    #[test]
    fn test_time_until_invalid_input_returned_unchanged() {
        assert_eq!(time_until("soon-ish"), "soon-ish");
    }
}
