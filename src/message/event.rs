// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events emitted by the monitor.
//!
//! Every event is a topic plus a payload, shaped for a pub/sub transport:
//!
//! ```text
//! <base>/<location>/<eventName>/On            1700000000000
//! <base>/<location>/<eventName>/Off-Since     1700000000000
//! <base>/<location>/<eventName>/On-For        "90s"
//! ```

use std::fmt;

use serde::Serialize;

use crate::types::Direction;

/// Which kind of notification an event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// Mirror of an accepted reading.
    State,
    /// The location has held its state for at least the check period.
    Since,
    /// The location has held its state for a configured threshold.
    For,
}

impl EventKind {
    /// The suffix appended to the direction segment.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::State => "",
            Self::Since => "-Since",
            Self::For => "-For",
        }
    }
}

/// The value carried by an event.
///
/// Serializes untagged: a number for timestamps, a string for durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Epoch milliseconds.
    Timestamp(i64),
    /// Threshold text exactly as the user supplied it.
    Duration(String),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ms) => write!(f, "{ms}"),
            Self::Duration(text) => f.write_str(text),
        }
    }
}

/// One output message of the monitor.
///
/// # Examples
///
/// ```
/// use housemon_flow::message::{MonitorEvent, Payload};
/// use housemon_flow::types::Direction;
///
/// let event = MonitorEvent::for_threshold("by/ll/oomon/", "garage", "motion", Direction::Off, "5m");
/// assert_eq!(event.topic, "by/ll/oomon/garage/motion/Off-For");
/// assert_eq!(event.payload, Payload::Duration("5m".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorEvent {
    /// Full output topic.
    pub topic: String,
    /// The location the event is about.
    pub location: String,
    /// On or Off.
    pub direction: Direction,
    /// State, Since or For.
    pub kind: EventKind,
    /// Timestamp or duration text.
    pub payload: Payload,
}

impl MonitorEvent {
    /// Builds an event, deriving its topic from the parts.
    #[must_use]
    pub fn new(
        base: &str,
        location: &str,
        event_name: &str,
        direction: Direction,
        kind: EventKind,
        payload: Payload,
    ) -> Self {
        let base = base.trim_end_matches('/');
        let topic = if base.is_empty() {
            format!("{location}/{event_name}/{direction}{}", kind.suffix())
        } else {
            format!("{base}/{location}/{event_name}/{direction}{}", kind.suffix())
        };
        Self {
            topic,
            location: location.to_string(),
            direction,
            kind,
            payload,
        }
    }

    /// An immediate On/Off mirror of a reading.
    #[must_use]
    pub fn state(
        base: &str,
        location: &str,
        event_name: &str,
        direction: Direction,
        timestamp: i64,
    ) -> Self {
        Self::new(
            base,
            location,
            event_name,
            direction,
            EventKind::State,
            Payload::Timestamp(timestamp),
        )
    }

    /// A periodic "has been in this state since" notification.
    #[must_use]
    pub fn since(
        base: &str,
        location: &str,
        event_name: &str,
        direction: Direction,
        reference: i64,
    ) -> Self {
        Self::new(
            base,
            location,
            event_name,
            direction,
            EventKind::Since,
            Payload::Timestamp(reference),
        )
    }

    /// A one-shot "has been in this state for" notification.
    #[must_use]
    pub fn for_threshold(
        base: &str,
        location: &str,
        event_name: &str,
        direction: Direction,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            base,
            location,
            event_name,
            direction,
            EventKind::For,
            Payload::Duration(text.into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_topic() {
        let event = MonitorEvent::state("by/ll/oomon", "garage", "onoff", Direction::On, 1000);
        assert_eq!(event.topic, "by/ll/oomon/garage/onoff/On");
        assert_eq!(event.kind, EventKind::State);
        assert_eq!(event.payload, Payload::Timestamp(1000));
    }

    #[test]
    fn since_topic() {
        let event = MonitorEvent::since("base", "hall", "motion", Direction::Off, 5);
        assert_eq!(event.topic, "base/hall/motion/Off-Since");
    }

    #[test]
    fn trailing_slash_in_base_is_not_doubled() {
        let event = MonitorEvent::state("by/ll/oomon//", "garage", "onoff", Direction::Off, 0);
        assert_eq!(event.topic, "by/ll/oomon/garage/onoff/Off");
    }

    #[test]
    fn empty_base() {
        let event = MonitorEvent::for_threshold("", "garage", "onoff", Direction::On, "1m");
        assert_eq!(event.topic, "garage/onoff/On-For");
    }

    #[test]
    fn payload_serializes_untagged() {
        let ts = serde_json::to_value(Payload::Timestamp(1_700_000_000_000)).unwrap();
        assert_eq!(ts, serde_json::json!(1_700_000_000_000_i64));

        let text = serde_json::to_value(Payload::Duration("90s".to_string())).unwrap();
        assert_eq!(text, serde_json::json!("90s"));
    }

    #[test]
    fn event_serializes_with_fields() {
        let event = MonitorEvent::for_threshold("b", "garage", "onoff", Direction::On, "90s");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["topic"], "b/garage/onoff/On-For");
        assert_eq!(json["direction"], "On");
        assert_eq!(json["kind"], "For");
        assert_eq!(json["payload"], "90s");
    }

    #[test]
    fn payload_display() {
        assert_eq!(Payload::Timestamp(12).to_string(), "12");
        assert_eq!(Payload::Duration("1m30s".to_string()).to_string(), "1m30s");
    }
}
