//! Human duration text such as `1h 30m` or `250ms`.

use crate::error::{Error, Result};
use crate::model::TimeUnit;

const NANOS_PER_MICRO: i128 = 1_000;

fn nanos_per(unit: TimeUnit) -> i128 {
    match unit {
        TimeUnit::Nanoseconds => 1,
        unit => i128::from(unit.to_micros(1)) * NANOS_PER_MICRO,
    }
}

fn suffix_unit(suffix: &str) -> Option<TimeUnit> {
    Some(match suffix {
        "d" => TimeUnit::Days,
        "h" => TimeUnit::Hours,
        "m" => TimeUnit::Minutes,
        "s" => TimeUnit::Seconds,
        "ms" => TimeUnit::Milliseconds,
        "us" | "µs" => TimeUnit::Microseconds,
        "ns" => TimeUnit::Nanoseconds,
        _ => return None,
    })
}

/// Parse `text` into a count of `unit`.
///
/// Blank text is zero. A bare integer is taken to be in `unit` already.
/// Otherwise the text is a list of `<n><suffix>` components (`d h m s ms us µs
/// ns`), optionally separated by whitespace, which are summed and truncated
/// toward zero in `unit`.
pub fn parse(text: &str, unit: TimeUnit) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(n);
    }

    let invalid = || Error::InvalidDuration(text.to_string());
    let mut total: i128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let value: i128 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let letters = rest
            .find(|c: char| c.is_ascii_digit() || c.is_whitespace())
            .unwrap_or(rest.len());
        let component = suffix_unit(&rest[..letters]).ok_or_else(invalid)?;
        rest = rest[letters..].trim_start();

        total = value
            .checked_mul(nanos_per(component))
            .and_then(|n| total.checked_add(n))
            .ok_or_else(invalid)?;
    }

    i64::try_from(total / nanos_per(unit)).map_err(|_| invalid())
}

/// Render microseconds with the largest unit that divides them evenly.
pub fn format_micros(us: i64) -> String {
    const UNITS: [TimeUnit; 5] = [
        TimeUnit::Days,
        TimeUnit::Hours,
        TimeUnit::Minutes,
        TimeUnit::Seconds,
        TimeUnit::Milliseconds,
    ];
    if us == 0 {
        return "0ms".to_string();
    }
    for unit in UNITS {
        let per = unit.to_micros(1);
        if us % per == 0 {
            return format!("{}{}", us / per, unit.short_name());
        }
    }
    format!("{us}us")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_zero() {
        assert_eq!(parse("", TimeUnit::Seconds).unwrap(), 0);
        assert_eq!(parse("   ", TimeUnit::Milliseconds).unwrap(), 0);
    }

    #[test]
    fn bare_integer_keeps_unit() {
        assert_eq!(parse("1500", TimeUnit::Milliseconds).unwrap(), 1500);
        assert_eq!(parse("-3", TimeUnit::Seconds).unwrap(), -3);
    }

    #[test]
    fn components_are_summed() {
        assert_eq!(parse("1h 30m", TimeUnit::Minutes).unwrap(), 90);
        assert_eq!(parse("1d 2h", TimeUnit::Hours).unwrap(), 26);
        assert_eq!(parse("2s 500ms", TimeUnit::Milliseconds).unwrap(), 2500);
        assert_eq!(parse("1m30s", TimeUnit::Seconds).unwrap(), 90);
        assert_eq!(parse("30s 1m", TimeUnit::Seconds).unwrap(), 90);
    }

    #[test]
    fn sub_microsecond_components() {
        assert_eq!(parse("1500ns", TimeUnit::Nanoseconds).unwrap(), 1500);
        assert_eq!(parse("3us 2µs", TimeUnit::Nanoseconds).unwrap(), 5000);
        assert_eq!(parse("1ms 1ns", TimeUnit::Microseconds).unwrap(), 1000);
    }

    #[test]
    fn converts_with_truncation() {
        assert_eq!(parse("1500ms", TimeUnit::Seconds).unwrap(), 1);
        assert_eq!(parse("59s", TimeUnit::Minutes).unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        for text in ["soon", "5 minutes", "h", "3x", "1.5h", "--1s"] {
            assert!(
                matches!(parse(text, TimeUnit::Seconds), Err(Error::InvalidDuration(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        let huge = format!("{}d", u64::MAX);
        assert!(parse(&huge, TimeUnit::Nanoseconds).is_err());
    }

    #[test]
    fn format_picks_largest_even_unit() {
        assert_eq!(format_micros(0), "0ms");
        assert_eq!(format_micros(90_000_000), "90s");
        assert_eq!(format_micros(3_600_000_000), "1h");
        assert_eq!(format_micros(1_500), "1500us");
        assert_eq!(format_micros(2_000), "2ms");
    }
}
