//! Timestamp normalization for session directory responses.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Threshold below which a numeric timestamp is treated as seconds.
const SECONDS_THRESHOLD: f64 = 1e12;

/// Normalizes a backend timestamp to epoch milliseconds.
///
/// Accepted shapes: numbers (second-epoch below `1e12`, millisecond-epoch
/// otherwise), numeric strings (same rule), and datetime strings. Anything
/// unparsable, including null, normalizes to "now".
pub fn to_epoch_millis(value: &Value) -> i64 {
    let now = Utc::now().timestamp_millis();
    match value {
        Value::Number(n) => n.as_f64().map_or(now, scale_numeric),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return now;
            }
            if let Ok(n) = trimmed.parse::<f64>() {
                return scale_numeric(n);
            }
            parse_datetime(trimmed).unwrap_or(now)
        }
        _ => now,
    }
}

fn scale_numeric(n: f64) -> i64 {
    if n < SECONDS_THRESHOLD {
        (n * 1000.0) as i64
    } else {
        n as i64
    }
}

fn parse_datetime(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}
