// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration feed entries.
//!
//! Parameter entries arrive as a key plus a loosely typed [`ConfigValue`].
//! [`Param`] is the typed form the monitor actually applies; converting an
//! entry validates both the key and the value type.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use housemon_flow::message::{ConfigValue, Param, ParamEntry};
//!
//! let entry = ParamEntry::new("checkPeriod", ConfigValue::from("45s"));
//! let param = Param::try_from(entry).unwrap();
//! assert_eq!(param, Param::CheckPeriod(Duration::from_secs(45)));
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::parse_duration;

/// A configuration value as supplied by a circuit definition.
///
/// Deserializes from a JSON boolean, number or string. The
/// [`ConfigValue::Duration`] variant is only produced programmatically.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum ConfigValue {
    /// A boolean flag.
    Bool(bool),
    /// Free text, including duration text such as `"90s"`.
    String(String),
    /// An already parsed duration.
    Duration(Duration),
    /// A number.
    Number(f64),
}

impl TryFrom<serde_json::Value> for ConfigValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| format!("number {n} is not representable")),
            other => Err(format!("unsupported config value: {other}")),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Duration> for ConfigValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ConfigValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// One entry of the parameter feed.
///
/// Accepts the flow `{"tag": ..., "msg": ...}` shape as well as
/// `{"key": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamEntry {
    /// The parameter name, matched case-insensitively.
    #[serde(alias = "tag")]
    pub key: String,
    /// The parameter value.
    #[serde(alias = "msg")]
    pub value: ConfigValue,
}

impl ParamEntry {
    /// Creates a parameter entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One entry of the threshold feed: a location and its duration text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThresholdEntry {
    /// The location the threshold applies to.
    #[serde(alias = "tag")]
    pub location: String,
    /// Duration text, reported verbatim in "For" events.
    #[serde(alias = "msg")]
    pub duration: String,
}

impl ThresholdEntry {
    /// Creates a threshold entry.
    #[must_use]
    pub fn new(location: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            duration: duration.into(),
        }
    }
}

/// A validated global parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Swap the on and off codes for all locations registered afterwards.
    Invert(bool),
    /// The event name segment of output topics.
    EventName(String),
    /// Policy code for locations that have not reported yet.
    ///
    /// Accepted and retained; it does not change output.
    Unknown(i64),
    /// Cadence of the "Since" ticker.
    CheckPeriod(Duration),
}

impl Param {
    /// The lower-case key this parameter is read from.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Invert(_) => "invert",
            Self::EventName(_) => "eventname",
            Self::Unknown(_) => "unknown",
            Self::CheckPeriod(_) => "checkperiod",
        }
    }
}

impl TryFrom<ParamEntry> for Param {
    type Error = ConfigError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(entry: ParamEntry) -> Result<Self, Self::Error> {
        let key = entry.key.to_ascii_lowercase();
        let mismatch = |expected: &'static str| ConfigError::InvalidParameterValue {
            key: key.clone(),
            expected,
        };

        match key.as_str() {
            "invert" => match entry.value {
                ConfigValue::Bool(b) => Ok(Self::Invert(b)),
                _ => Err(mismatch("a boolean")),
            },
            "eventname" => match entry.value {
                ConfigValue::String(s) if !s.is_empty() => Ok(Self::EventName(s)),
                _ => Err(mismatch("a non-empty string")),
            },
            "unknown" => match entry.value {
                ConfigValue::Number(n) if n.is_finite() && n.fract().abs() < f64::EPSILON => {
                    Ok(Self::Unknown(n as i64))
                }
                _ => Err(mismatch("an integer")),
            },
            "checkperiod" => {
                let period = match entry.value {
                    ConfigValue::String(text) => parse_duration(&text)?,
                    ConfigValue::Duration(d) => d,
                    _ => return Err(mismatch("duration text")),
                };
                if period.is_zero() {
                    return Err(mismatch("a non-zero duration"));
                }
                Ok(Self::CheckPeriod(period))
            }
            _ => Err(ConfigError::UnknownParameter(entry.key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let param = Param::try_from(ParamEntry::new("eventName", "motion")).unwrap();
        assert_eq!(param, Param::EventName("motion".to_string()));
        assert_eq!(param.key(), "eventname");

        let param = Param::try_from(ParamEntry::new("INVERT", true)).unwrap();
        assert_eq!(param, Param::Invert(true));
    }

    #[test]
    fn check_period_from_text_or_duration() {
        let param = Param::try_from(ParamEntry::new("checkperiod", "1m")).unwrap();
        assert_eq!(param, Param::CheckPeriod(Duration::from_secs(60)));

        let param =
            Param::try_from(ParamEntry::new("checkperiod", Duration::from_secs(5))).unwrap();
        assert_eq!(param, Param::CheckPeriod(Duration::from_secs(5)));
    }

    #[test]
    fn check_period_rejects_bad_text_and_zero() {
        let err = Param::try_from(ParamEntry::new("checkperiod", "soon")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));

        let err = Param::try_from(ParamEntry::new("checkperiod", "0s")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameterValue { .. }));
    }

    #[test]
    fn unknown_policy_requires_integer() {
        let param = Param::try_from(ParamEntry::new("unknown", -1_i64)).unwrap();
        assert_eq!(param, Param::Unknown(-1));

        let err = Param::try_from(ParamEntry::new("unknown", 0.5)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParameterValue {
                key: "unknown".to_string(),
                expected: "an integer",
            }
        );
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let err = Param::try_from(ParamEntry::new("invert", "yes")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameterValue { .. }));
    }

    #[test]
    fn unrecognized_key_is_rejected() {
        let err = Param::try_from(ParamEntry::new("colour", "blue")).unwrap_err();
        assert_eq!(err, ConfigError::UnknownParameter("colour".to_string()));
    }

    #[test]
    fn deserialize_flow_tag_shape() {
        let entry: ParamEntry = serde_json::from_str(r#"{"tag":"invert","msg":true}"#).unwrap();
        assert_eq!(entry, ParamEntry::new("invert", true));

        let entry: ParamEntry =
            serde_json::from_str(r#"{"key":"unknown","value":2}"#).unwrap();
        assert_eq!(entry.value, ConfigValue::Number(2.0));

        let threshold: ThresholdEntry =
            serde_json::from_str(r#"{"tag":"garage","msg":"2m30s"}"#).unwrap();
        assert_eq!(threshold, ThresholdEntry::new("garage", "2m30s"));
    }

    #[test]
    fn deserialize_rejects_structured_values() {
        let result = serde_json::from_str::<ParamEntry>(r#"{"tag":"invert","msg":[1]}"#);
        assert!(result.is_err());
    }
}
