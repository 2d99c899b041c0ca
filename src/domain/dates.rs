//! Date Handling
//!
//! Plans are edited with `dd/mm/yyyy` text and stored as RFC 3339 instants.
//! All conversions use UTC so a display date survives the round trip.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Parse `dd/mm/yyyy`, `yyyy-mm-dd`, or a full timestamp
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, DISPLAY_FORMAT) {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output, e.g. "2025-12-31 00:00:00+00"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Normalize free text to an instant, falling back to `now` when unparsable
pub fn ensure_valid_date_at(input: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match parse_date(input) {
        Some(dt) => dt,
        None => {
            log::warn!("unparsable date {:?}, substituting current time", input);
            now
        }
    }
}

/// Normalize free text to an instant, falling back to the current time
pub fn ensure_valid_date(input: &str) -> DateTime<Utc> {
    ensure_valid_date_at(input, Utc::now())
}

/// `dd/mm/yyyy`
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format(DISPLAY_FORMAT).to_string()
}

/// Storage form of an instant
pub fn to_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stored timestamp text to display form; empty when unparsable
pub fn display_from_iso(stored: &str) -> String {
    parse_date(stored).map(|d| format_date(&d)).unwrap_or_default()
}

/// Current instant in storage form
pub fn now_iso() -> String {
    to_iso(&Utc::now())
}
