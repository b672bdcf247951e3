use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use thiserror::Error;

const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MAX_FRACTION_DIGITS: usize = 6;

/// Parses the two timestamp shapes accepted on the query surface:
/// `2021-10-23T14:08:11Z` and `2021-10-23T14:08:11.123456Z` (1-6 fraction digits).
/// The trailing `Z` is read as UTC.
pub fn parse_query_instant(s: &str) -> Option<f64> {
    let body = s.strip_suffix('Z')?;
    let (whole, micros) = match body.split_once('.') {
        Some((whole, frac)) => (whole, parse_fraction(frac)?),
        None => (body, 0),
    };

    let dt = DateTime::strptime(QUERY_FORMAT, whole).ok()?;
    let ts = TimeZone::UTC.to_timestamp(dt).ok()?;
    Some(ts.as_second() as f64 + micros as f64 / 1_000_000.0)
}

fn parse_fraction(frac: &str) -> Option<u32> {
    if frac.is_empty()
        || frac.len() > MAX_FRACTION_DIGITS
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let digits: u32 = frac.parse().ok()?;
    Some(digits * 10u32.pow((MAX_FRACTION_DIGITS - frac.len()) as u32))
}

/// Timestamps found in bulk input. Accepts raw epoch seconds, either query
/// shape, or any RFC 3339 instant (`2021-10-23T14:08:11.934+00:00`).
pub fn parse_sample_instant(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return secs.is_finite().then_some(secs);
    }
    if let Some(secs) = parse_query_instant(s) {
        return Some(secs);
    }
    let ts: Timestamp = s.parse().ok()?;
    Some(ts.as_microsecond() as f64 / 1_000_000.0)
}

#[derive(Error, Debug, PartialEq)]
pub enum TimestampError {
    #[error("timestamp `{0}` is not a finite number")]
    NotFinite(f64),
    #[error("timestamp `{0}` cannot be represented: {1}")]
    OutOfRange(f64, String),
}

/// Renders epoch seconds as UTC ISO-8601 with microsecond precision,
/// e.g. `2021-10-23T14:08:11.934000Z`.
pub fn epoch_to_iso(secs: f64) -> Result<String, TimestampError> {
    if !secs.is_finite() {
        return Err(TimestampError::NotFinite(secs));
    }

    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return Err(TimestampError::OutOfRange(secs, "overflows i64".to_string()));
    }

    let ts = Timestamp::from_microsecond(micros as i64)
        .map_err(|e| TimestampError::OutOfRange(secs, e.to_string()))?;
    let dt = TimeZone::UTC.to_datetime(ts);
    Ok(format!(
        "{}.{:06}Z",
        dt.strftime(QUERY_FORMAT),
        dt.subsec_nanosecond() / 1_000
    ))
}
