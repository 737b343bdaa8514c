//! Duration strings in the `300ms` / `10s` / `1h30m` grammar.
//!
//! A duration is an optional sign followed by one or more decimal numbers,
//! each with an optional fraction and a mandatory unit suffix. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed.
//! Negative durations are already due and clamp to zero.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration '{0}'")]
    InvalidNumber(String),

    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    #[error("duration '{0}' is out of range")]
    Overflow(String),
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3600 * NANOS_PER_SECOND),
        _ => None,
    }
}

fn leading_digits(s: &str) -> (&str, &str) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(len)
}

pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    if input.is_empty() {
        return Err(DurationError::Empty);
    }

    let (negative, mut rest) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::InvalidNumber(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let (whole, after_whole) = leading_digits(rest);
        let (fraction, after_number) = match after_whole.strip_prefix('.') {
            Some(tail) => leading_digits(tail),
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(DurationError::InvalidNumber(input.to_string()));
        }

        let unit_len = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !fraction.is_empty() {
            // Digits past nanosecond precision of the largest unit cannot matter.
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| overflow())?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos += numerator * scale / denominator;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = tail;
    }

    if total > u64::MAX as u128 {
        return Err(overflow());
    }
    if negative {
        return Ok(Duration::ZERO);
    }

    Ok(Duration::from_nanos(total as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("300ms"), Ok(Duration::from_millis(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("7us"), Ok(Duration::from_micros(7)));
        assert_eq!(parse_duration("7µs"), Ok(Duration::from_micros(7)));
        assert_eq!(parse_duration("42ns"), Ok(Duration::from_nanos(42)));
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration(".5s"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2h45m30.25s"), Ok(Duration::from_millis(9_930_250)));
        assert_eq!(parse_duration("+1s"), Ok(Duration::from_secs(1)));
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(parse_duration("-5s"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("-1h30m"), Ok(Duration::ZERO));
        assert!(matches!(parse_duration("-5"), Err(DurationError::MissingUnit(_))));
    }

    #[test]
    fn test_zero_forms() {
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("-0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("0s"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("10"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("ten seconds"), Err(DurationError::InvalidNumber(_))));
        assert!(matches!(parse_duration("10 s"), Err(DurationError::UnknownUnit { .. })));
        assert!(matches!(parse_duration("3d"), Err(DurationError::UnknownUnit { .. })));
        assert!(matches!(parse_duration("."), Err(DurationError::InvalidNumber(_))));
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }
}
