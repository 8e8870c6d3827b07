// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `housemon_flow` library.
//!
//! None of these errors is fatal to a running monitor. Configuration and
//! reading errors are logged and the offending entry is dropped; scheduler
//! exhaustion only disarms the "For" timer.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration entry could not be applied.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A reading could not be interpreted.
    #[error("reading error: {0}")]
    Reading(#[from] ReadingError),

    /// The deadline scheduler has nothing to do.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// An internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// The monitor task ended abnormally.
    #[error("monitor task failed: {0}")]
    TaskFailed(String),
}

/// Errors raised while applying configuration feed entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Duration text could not be parsed.
    #[error("invalid duration {text:?}: {reason}")]
    InvalidDuration {
        /// The text as supplied by the user.
        text: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The parameter key is not one the monitor understands.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// The parameter value has the wrong type for its key.
    #[error("parameter {key} expects {expected}")]
    InvalidParameterValue {
        /// The parameter key.
        key: String,
        /// Description of the accepted value type.
        expected: &'static str,
    },

    /// A threshold names a location that was never registered as a filter.
    #[error("location {0:?} is not registered")]
    UnregisteredLocation(String),

    /// A configuration feed was not closed within the drain timeout.
    #[error("{feed} feed not closed after {waited_ms} ms")]
    DrainTimeout {
        /// The name of the feed.
        feed: &'static str,
        /// How long the monitor waited.
        waited_ms: u128,
    },
}

/// Errors related to incoming readings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadingError {
    /// The topic has fewer segments than `<prefix>/<location>/<timestamp>`.
    #[error("topic {topic:?} has {segments} segments, expected at least 3")]
    TooFewSegments {
        /// The offending topic.
        topic: String,
        /// How many segments were found.
        segments: usize,
    },
}

/// Conditions reported by the deadline scheduler.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// No tracked location has a pending deadline.
    #[error("no pending deadlines")]
    Exhausted,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
