use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::TimeUnit;

pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Process settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Unit of session request times that name no unit of their own.
    pub default_unit: TimeUnit,
    pub metrics_port: Option<u16>,
    /// Longest request line a session accepts.
    pub max_line_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_unit: TimeUnit::Milliseconds,
            metrics_port: None,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl Config {
    /// `RESLOT_DEFAULT_UNIT`, `RESLOT_METRICS_PORT`, `RESLOT_MAX_LINE_BYTES`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            default_unit: parse_var(&lookup, "RESLOT_DEFAULT_UNIT")?.unwrap_or(defaults.default_unit),
            metrics_port: parse_var(&lookup, "RESLOT_METRICS_PORT")?,
            max_line_bytes: parse_var(&lookup, "RESLOT_MAX_LINE_BYTES")?
                .unwrap_or(defaults.max_line_bytes),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}"))),
    }
}
