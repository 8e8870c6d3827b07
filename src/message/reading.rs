// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor readings and their topic layout.
//!
//! A reading topic looks like `sensor/<location>/<attribute...>/<timestamp>`,
//! for example `sensor/garage/moved/1389000000000`. Only the second segment
//! (the location) and the last segment (a millisecond timestamp) matter.
//!
//! # Examples
//!
//! ```
//! use housemon_flow::message::ParsedTopic;
//!
//! let parsed = ParsedTopic::parse("sensor/garage/moved/1389000000000").unwrap();
//! assert_eq!(parsed.location, "garage");
//! assert_eq!(parsed.timestamp, Some(1_389_000_000_000));
//!
//! // A non-numeric tail means "no timestamp", not an error
//! let parsed = ParsedTopic::parse("sensor/garage/moved").unwrap();
//! assert_eq!(parsed.timestamp, None);
//! ```

use serde::Deserialize;

use crate::error::ReadingError;

/// Minimum number of `/`-separated segments in a reading topic.
const MIN_SEGMENTS: usize = 3;

/// A reading from the live feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    /// Hierarchical topic, `<prefix>/<location>/<attribute...>/<timestampMs>`.
    #[serde(alias = "tag")]
    pub topic: String,
    /// The sentinel-coded state.
    #[serde(alias = "msg")]
    pub value: f64,
}

impl Reading {
    /// Creates a reading.
    #[must_use]
    pub fn new(topic: impl Into<String>, value: f64) -> Self {
        Self {
            topic: topic.into(),
            value,
        }
    }
}

/// The parts of a reading topic the monitor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTopic<'a> {
    /// The second segment of the topic.
    pub location: &'a str,
    /// The last segment as epoch milliseconds, if it parses as one.
    pub timestamp: Option<i64>,
}

impl<'a> ParsedTopic<'a> {
    /// Parses a reading topic.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::TooFewSegments`] if the topic has fewer than
    /// three `/`-separated segments.
    pub fn parse(topic: &'a str) -> Result<Self, ReadingError> {
        let segments: Vec<&str> = topic.split('/').collect();
        if segments.len() < MIN_SEGMENTS {
            return Err(ReadingError::TooFewSegments {
                topic: topic.to_string(),
                segments: segments.len(),
            });
        }

        let timestamp = segments
            .last()
            .and_then(|tail| tail.parse::<i64>().ok());

        Ok(Self {
            location: segments[1],
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_topic() {
        let parsed = ParsedTopic::parse("sensor/kitchen/door/open/1700000000123").unwrap();
        assert_eq!(parsed.location, "kitchen");
        assert_eq!(parsed.timestamp, Some(1_700_000_000_123));
    }

    #[test]
    fn parse_minimal_topic() {
        let parsed = ParsedTopic::parse("sensor/kitchen/42").unwrap();
        assert_eq!(parsed.location, "kitchen");
        assert_eq!(parsed.timestamp, Some(42));
    }

    #[test]
    fn unparseable_tail_has_no_timestamp() {
        let parsed = ParsedTopic::parse("sensor/kitchen/moved").unwrap();
        assert_eq!(parsed.timestamp, None);

        let parsed = ParsedTopic::parse("sensor/kitchen/moved/12.5").unwrap();
        assert_eq!(parsed.timestamp, None);
    }

    #[test]
    fn too_few_segments() {
        let err = ParsedTopic::parse("sensor/kitchen").unwrap_err();
        assert_eq!(
            err,
            ReadingError::TooFewSegments {
                topic: "sensor/kitchen".to_string(),
                segments: 2,
            }
        );
        assert!(ParsedTopic::parse("").is_err());
    }

    #[test]
    fn deserialize_reading() {
        let reading: Reading =
            serde_json::from_str(r#"{"tag":"sensor/garage/moved/1000","msg":1}"#).unwrap();
        assert_eq!(reading, Reading::new("sensor/garage/moved/1000", 1.0));
    }
}
