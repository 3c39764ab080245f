use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Error;

/// Unix microseconds. The only time type.
pub type Us = i64;

/// Unit of a caller-supplied time value. Everything is normalized to [`Us`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "ns")]
    Nanoseconds,
    #[serde(alias = "us", alias = "µs")]
    Microseconds,
    #[serde(alias = "ms")]
    Milliseconds,
    #[serde(alias = "s")]
    Seconds,
    #[serde(alias = "m", alias = "min")]
    Minutes,
    #[serde(alias = "h")]
    Hours,
    #[serde(alias = "d")]
    Days,
}

impl TimeUnit {
    /// Microseconds per unit. Zero for nanoseconds, which are finer than `Us`.
    const fn micros_per_unit(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 0,
            TimeUnit::Microseconds => 1,
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Seconds => 1_000_000,
            TimeUnit::Minutes => 60_000_000,
            TimeUnit::Hours => 3_600_000_000,
            TimeUnit::Days => 86_400_000_000,
        }
    }

    /// Convert `value` in this unit to microseconds. Nanoseconds truncate toward zero.
    pub fn to_micros(self, value: i64) -> Us {
        match self {
            TimeUnit::Nanoseconds => value / 1_000,
            unit => value.saturating_mul(unit.micros_per_unit()),
        }
    }

    /// Convert microseconds into this unit, truncating toward zero.
    pub fn from_micros(self, us: Us) -> i64 {
        match self {
            TimeUnit::Nanoseconds => us.saturating_mul(1_000),
            unit => us / unit.micros_per_unit(),
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            "us" | "µs" | "micros" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "min" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hours" => Ok(TimeUnit::Hours),
            "d" | "days" => Ok(TimeUnit::Days),
            _ => Err(Error::UnknownVariant {
                kind: "time unit",
                value: s.to_string(),
            }),
        }
    }
}

/// Half-open interval `[begin, end)` in microseconds.
///
/// The constructor does not check ordering. Degenerate (`begin == end`) and
/// inverted (`begin > end`) spans are legal values; both cover nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: Us,
    pub end: Us,
}

impl Span {
    pub fn new(begin: Us, end: Us) -> Self {
        Self { begin, end }
    }

    /// Like [`Span::new`], but refuses a begin after the end.
    pub fn checked(begin: Us, end: Us) -> Result<Self, Error> {
        if begin > end {
            return Err(Error::InvertedSpan { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Build from endpoints given in `unit`.
    pub fn from_units(begin: i64, end: i64, unit: TimeUnit) -> Self {
        Self::new(unit.to_micros(begin), unit.to_micros(end))
    }

    /// Read the endpoints back in `unit`.
    pub fn to_units(&self, unit: TimeUnit) -> (i64, i64) {
        (unit.from_micros(self.begin), unit.from_micros(self.end))
    }

    /// A span starting `delay` after now and lasting `duration`. Now is read once.
    pub fn relative(delay: i64, duration: i64, unit: TimeUnit, clock: &impl Clock) -> Self {
        let begin = clock.now_us().saturating_add(unit.to_micros(delay));
        let end = begin.saturating_add(unit.to_micros(duration));
        Self::new(begin, end)
    }

    /// Zero for degenerate and inverted spans.
    pub fn duration_us(&self) -> Us {
        self.end.saturating_sub(self.begin).max(0)
    }

    /// True if the span covers nothing, including inverted spans.
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    pub fn is_degenerate(&self) -> bool {
        self.begin == self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.begin > self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        !self.is_inverted()
            && !other.is_inverted()
            && self.begin < other.end
            && other.begin < self.end
    }

    pub fn contains_instant(&self, t: Us) -> bool {
        self.begin <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// True if the whole span lies after `t`.
    pub fn is_after(&self, t: Us) -> bool {
        self.begin > t
    }

    pub fn with_begin(&self, begin: Us) -> Self {
        Self::new(begin, self.end)
    }

    pub fn with_end(&self, end: Us) -> Self {
        Self::new(self.begin, end)
    }
}
