//! Go-style duration strings (`1h0m0s`, `90s`, `1h30m`, `500ms`).
//!
//! Task timeouts are written in this format in pipeline documents.

use std::time::Duration;
use thiserror::Error;

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{input}': {reason}")]
pub struct DurationParseError {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl DurationParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

/// Parses a Go-style duration string.
///
/// # Errors
///
/// Returns an error for empty input, negative durations, unknown units, or
/// numbers without a unit (other than a bare `0`).
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationParseError::new(input, "empty string"));
    }
    if s.starts_with('-') {
        return Err(DurationParseError::new(input, "negative durations are not allowed"));
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(DurationParseError::new(input, "expected a number"));
        }
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationParseError::new(input, "missing unit"));
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| DurationParseError::new(input, format!("unknown unit '{unit}'")))?;

        total = total
            .checked_add(scale_number(input, number, scale)?)
            .ok_or_else(|| DurationParseError::new(input, "duration overflows"))?;
        rest = tail;
    }

    let secs = u64::try_from(total / 1_000_000_000)
        .map_err(|_| DurationParseError::new(input, "duration overflows"))?;
    // Remainder is always below one second.
    let nanos = (total % 1_000_000_000) as u32;
    Ok(Duration::new(secs, nanos))
}

fn scale_number(input: &str, number: &str, scale: u128) -> Result<u128, DurationParseError> {
    let (whole, frac) = match number.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(DurationParseError::new(input, "expected a number"));
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| DurationParseError::new(input, "invalid number"))?
    };

    let nanos = whole
        .checked_mul(scale)
        .ok_or_else(|| DurationParseError::new(input, "duration overflows"))?;

    let mut divisor: u128 = 1;
    let mut fraction: u128 = 0;
    for digit in frac.chars() {
        let d = digit
            .to_digit(10)
            .ok_or_else(|| DurationParseError::new(input, "invalid number"))?;
        // Digits beyond nanosecond precision are dropped.
        if divisor >= 1_000_000_000_000 {
            break;
        }
        fraction = fraction * 10 + u128::from(d);
        divisor *= 10;
    }
    nanos
        .checked_add(fraction * scale / divisor)
        .ok_or_else(|| DurationParseError::new(input, "duration overflows"))
}

/// Formats a duration the way Go's `time.Duration.String` does.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let total_nanos = duration.as_nanos();
    if total_nanos < 1_000_000_000 {
        return if total_nanos % 1_000_000 == 0 {
            format!("{}ms", total_nanos / 1_000_000)
        } else if total_nanos % 1_000 == 0 {
            format!("{}µs", total_nanos / 1_000)
        } else {
            format!("{total_nanos}ns")
        };
    }

    let secs = duration.as_secs();
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    let sub_nanos = duration.subsec_nanos();

    let mut seconds_part = seconds.to_string();
    if sub_nanos > 0 {
        let frac = format!("{sub_nanos:09}");
        seconds_part.push('.');
        seconds_part.push_str(frac.trim_end_matches('0'));
    }

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds_part}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds_part}s")
    } else {
        format!("{seconds_part}s")
    }
}

/// Serde adapter for optional duration fields.
pub mod optional {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes an optional duration as a Go-style string.
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional Go-style duration string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
