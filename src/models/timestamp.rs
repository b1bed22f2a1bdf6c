//! Normalization helpers applied to raw wire values.
//!
//! The server is loose about timestamp formats: RFC 3339 datetimes, naive
//! datetimes, bare dates, and numeric Unix epochs all occur. Everything is
//! normalized to `DateTime<Utc>` here; a naive timestamp is interpreted as
//! UTC, never as local time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::errors::{ModeApiError, Result};

/// Trims and uppercases a ticker symbol.
///
/// # Errors
///
/// Returns [`ModeApiError::Validation`] if the trimmed symbol is empty.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ModeApiError::validation(
            "symbol",
            raw,
            "symbol must not be empty",
        ));
    }
    Ok(symbol)
}

/// Parses a loosely-typed wire timestamp into UTC.
///
/// Accepted forms:
/// - RFC 3339 datetime (`2023-01-01T09:30:00-05:00`), converted to UTC
/// - naive datetime (`2023-01-01T09:30:00`, optional fraction), taken as UTC
/// - bare date (`2023-01-01`), taken as midnight UTC
/// - numeric Unix epoch seconds, integer or fractional
pub fn parse_timestamp(field: &str, value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(field, s),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| out_of_range(field, value))
            } else if let Some(secs) = n.as_f64() {
                if secs < 0.0 {
                    return Err(out_of_range(field, value));
                }
                let nanos = (secs.fract() * 1_000_000_000.0) as u32;
                Utc.timestamp_opt(secs.trunc() as i64, nanos)
                    .single()
                    .ok_or_else(|| out_of_range(field, value))
            } else {
                Err(out_of_range(field, value))
            }
        }
        other => Err(ModeApiError::validation(
            field,
            other,
            "timestamp must be a string or a number",
        )),
    }
}

fn parse_timestamp_str(field: &str, s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Naive forms are interpreted as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(ModeApiError::validation(
        field,
        s,
        "unrecognized timestamp format",
    ))
}

fn out_of_range(field: &str, value: &Value) -> ModeApiError {
    ModeApiError::validation(field, value, "timestamp out of range")
}
