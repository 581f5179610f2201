//! Human-readable event times.
//!
//! All formatters take the raw wire string and never fail: an instant that
//! can't be parsed is returned exactly as given.

use chrono::{DateTime, Utc};

use crate::zone::{DisplayZones, TimeZoneMode};

/// `Thu, Mar 14, 8:00 PM`
const EVENT_TIME_FORMAT: &str = "%a, %b %-d, %-I:%M %p";

/// `Thu, Mar 14, 2024, 8:00 PM`
const NOTIFICATION_TIME_FORMAT: &str = "%a, %b %-d, %Y, %-I:%M %p";

/// Parse an RFC 3339 instant (any offset) into UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a raw instant in the zone selected by `mode`.
pub fn format_event_time(raw: &str, mode: TimeZoneMode, zones: &DisplayZones) -> String {
    match parse_instant(raw) {
        Some(instant) => format_instant(instant, mode, zones),
        None => raw.to_string(),
    }
}

/// Format an already-parsed instant in the zone selected by `mode`.
pub fn format_instant(instant: DateTime<Utc>, mode: TimeZoneMode, zones: &DisplayZones) -> String {
    instant
        .with_timezone(&zones.zone(mode))
        .format(EVENT_TIME_FORMAT)
        .to_string()
}

/// Short label for the zone selected by `mode` (e.g. `SLT`, `New York`).
pub fn time_label(mode: TimeZoneMode, zones: &DisplayZones) -> String {
    zones.label(mode)
}

/// Reference-zone time with year and zone label, as used in webhook messages.
pub fn format_notification_time(raw: &str, zones: &DisplayZones) -> String {
    match parse_instant(raw) {
        Some(instant) => format!(
            "{} {}",
            instant
                .with_timezone(&zones.reference())
                .format(NOTIFICATION_TIME_FORMAT),
            zones.label(TimeZoneMode::Reference)
        ),
        None => raw.to_string(),
    }
}
