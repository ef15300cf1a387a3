// ABOUTME: Glucose reading models shared by the gateway, fetch, and stream layers
// ABOUTME: Raw wire records, normalized readings with epoch timestamps, and trend arrows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rate-of-change classification reported alongside each reading
///
/// Older service versions send the numeric code, newer ones send the name;
/// both are accepted when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "TrendRepr")]
pub enum Trend {
    /// No trend available
    #[default]
    None,
    /// Rising quickly (more than 3 mg/dL per minute)
    DoubleUp,
    /// Rising (2-3 mg/dL per minute)
    SingleUp,
    /// Rising slowly (1-2 mg/dL per minute)
    FortyFiveUp,
    /// Steady
    Flat,
    /// Falling slowly (1-2 mg/dL per minute)
    FortyFiveDown,
    /// Falling (2-3 mg/dL per minute)
    SingleDown,
    /// Falling quickly (more than 3 mg/dL per minute)
    DoubleDown,
    /// Trend could not be computed
    NotComputable,
    /// Rate of change outside the measurable range
    OutOfRange,
}

impl Trend {
    /// Map the service's numeric code to a trend
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::DoubleUp,
            2 => Self::SingleUp,
            3 => Self::FortyFiveUp,
            4 => Self::Flat,
            5 => Self::FortyFiveDown,
            6 => Self::SingleDown,
            7 => Self::DoubleDown,
            8 => Self::NotComputable,
            9 => Self::OutOfRange,
            _ => return None,
        })
    }

    /// Numeric code as used on the wire
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Arrow glyph for compact display
    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::DoubleUp => "⇈",
            Self::SingleUp => "↑",
            Self::FortyFiveUp => "↗",
            Self::Flat => "→",
            Self::FortyFiveDown => "↘",
            Self::SingleDown => "↓",
            Self::DoubleDown => "⇊",
            Self::None | Self::NotComputable | Self::OutOfRange => "?",
        }
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::None => "no trend",
            Self::DoubleUp => "rising quickly",
            Self::SingleUp => "rising",
            Self::FortyFiveUp => "rising slightly",
            Self::Flat => "steady",
            Self::FortyFiveDown => "falling slightly",
            Self::SingleDown => "falling",
            Self::DoubleDown => "falling quickly",
            Self::NotComputable => "not computable",
            Self::OutOfRange => "rate out of range",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "None" | "NONE" => Self::None,
            "DoubleUp" => Self::DoubleUp,
            "SingleUp" => Self::SingleUp,
            "FortyFiveUp" => Self::FortyFiveUp,
            "Flat" => Self::Flat,
            "FortyFiveDown" => Self::FortyFiveDown,
            "SingleDown" => Self::SingleDown,
            "DoubleDown" => Self::DoubleDown,
            "NotComputable" => Self::NotComputable,
            "OutOfRange" | "RateOutOfRange" => Self::OutOfRange,
            _ => return None,
        })
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Wire representation of a trend: numeric code or variant name
#[derive(Deserialize)]
#[serde(untagged)]
enum TrendRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<TrendRepr> for Trend {
    type Error = String;

    fn try_from(repr: TrendRepr) -> Result<Self, Self::Error> {
        match repr {
            TrendRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown trend code {code}"))
            }
            TrendRepr::Name(name) => {
                Self::from_name(&name).ok_or_else(|| format!("unknown trend name {name:?}"))
            }
        }
    }
}

/// Reading record exactly as returned by the latest-glucose endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReading {
    /// Display time recorded by the receiver, e.g. `/Date(1426292016000-0700)/`
    #[serde(rename = "DT")]
    pub display_time: String,
    /// System time recorded by the receiver
    #[serde(rename = "ST")]
    pub system_time: String,
    /// Server time, e.g. `/Date(1426292016000)/`
    #[serde(rename = "WT")]
    pub wire_time: String,
    /// Trend classification
    #[serde(rename = "Trend", default)]
    pub trend: Trend,
    /// Glucose value in mg/dL
    #[serde(rename = "Value")]
    pub value: u16,
}

/// Normalized glucose reading with a numeric epoch timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Display time recorded by the receiver
    pub display_time: String,
    /// System time recorded by the receiver
    pub system_time: String,
    /// Trend classification
    pub trend: Trend,
    /// Glucose value in mg/dL
    pub value: u16,
    /// Server time string as received
    pub wire_time: String,
    /// Milliseconds since the Unix epoch, parsed from `wire_time`
    pub epoch_ms: i64,
}

impl Reading {
    /// Server timestamp as a `DateTime`, if the epoch is representable
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.epoch_ms).single()
    }
}

impl From<RawReading> for Reading {
    fn from(raw: RawReading) -> Self {
        let epoch_ms = parse_wire_date(&raw.wire_time);
        Self {
            display_time: raw.display_time,
            system_time: raw.system_time,
            trend: raw.trend,
            value: raw.value,
            wire_time: raw.wire_time,
            epoch_ms,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp() {
            Some(ts) => write!(f, "{} mg/dL {} at {}", self.value, self.trend.arrow(), ts.to_rfc3339()),
            None => write!(f, "{} mg/dL {}", self.value, self.trend.arrow()),
        }
    }
}

/// Extract the epoch milliseconds from a `Date(<millis>[offset])` string
///
/// Only the leading integer inside the parentheses is used; a trailing
/// timezone offset such as `-0700` is ignored. Unparsable input yields 0.
#[must_use]
pub fn parse_wire_date(raw: &str) -> i64 {
    let Some(start) = raw.find("Date(") else {
        return 0;
    };
    let inner = &raw[start + "Date(".len()..];
    let digits_end = inner
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(inner.len(), |(i, _)| i);
    inner[..digits_end].parse().unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_date_plain() {
        assert_eq!(parse_wire_date("/Date(1426292016000)/"), 1_426_292_016_000);
        assert_eq!(parse_wire_date("Date(1649213749000)"), 1_649_213_749_000);
    }

    #[test]
    fn test_parse_wire_date_ignores_offset() {
        assert_eq!(parse_wire_date("/Date(1426292016000-0700)/"), 1_426_292_016_000);
    }

    #[test]
    fn test_parse_wire_date_garbage_is_zero() {
        assert_eq!(parse_wire_date("2015-03-14T00:00:00"), 0);
        assert_eq!(parse_wire_date("Date()"), 0);
        assert_eq!(parse_wire_date(""), 0);
    }

    #[test]
    fn test_trend_accepts_code_and_name() {
        let by_code: Trend = serde_json::from_str("4").unwrap();
        let by_name: Trend = serde_json::from_str("\"Flat\"").unwrap();
        assert_eq!(by_code, Trend::Flat);
        assert_eq!(by_name, Trend::Flat);

        let legacy: Trend = serde_json::from_str("\"RateOutOfRange\"").unwrap();
        assert_eq!(legacy, Trend::OutOfRange);
    }

    #[test]
    fn test_trend_codes_match_wire_values() {
        for code in 0..=9 {
            let trend = Trend::from_code(code).unwrap();
            assert_eq!(trend.code(), code);
            let decoded: Trend = serde_json::from_str(&code.to_string()).unwrap();
            assert_eq!(decoded, trend);
        }
        assert_eq!(Trend::from_code(10), None);
    }

    #[test]
    fn test_trend_rejects_unknown() {
        assert!(serde_json::from_str::<Trend>("12").is_err());
        assert!(serde_json::from_str::<Trend>("\"Sideways\"").is_err());
    }

    #[test]
    fn test_raw_reading_normalizes() {
        let raw: RawReading = serde_json::from_str(
            r#"{"DT":"/Date(1426292016000-0700)/","ST":"/Date(1426295616000)/","WT":"/Date(1426292039000)/","Trend":"SingleDown","Value":142}"#,
        )
        .unwrap();
        let reading = Reading::from(raw);

        assert_eq!(reading.epoch_ms, 1_426_292_039_000);
        assert_eq!(reading.trend, Trend::SingleDown);
        assert_eq!(reading.value, 142);
        assert_eq!(
            reading.timestamp().map(|ts| ts.timestamp_millis()),
            Some(1_426_292_039_000)
        );
    }
}
