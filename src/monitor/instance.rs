// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The monitor's state table and deadline scheduler.
//!
//! [`MonitorInstance`] holds every [`WatchedState`] and implements the
//! monitor's behavior as plain synchronous methods that take the current
//! time as an argument. The async runtime in [`super::OnOffMonitor`] only
//! decides *when* to call them.
//!
//! # Examples
//!
//! ```
//! use housemon_flow::message::{Reading, ThresholdEntry};
//! use housemon_flow::monitor::{MonitorConfig, MonitorInstance, ReadingOutcome};
//!
//! let mut monitor = MonitorInstance::new(&MonitorConfig::default(), 0);
//! monitor.register("garage");
//! monitor.add_threshold(&ThresholdEntry::new("garage", "30s")).unwrap();
//!
//! let outcome = monitor
//!     .handle_reading(&Reading::new("sensor/garage/moved/0", 1.0), 0)
//!     .unwrap();
//! assert!(matches!(outcome, ReadingOutcome::Accepted { transitioned: true, .. }));
//! assert_eq!(monitor.next_deadline(), Ok(30_000));
//!
//! let fired = monitor.fire_due(30_000);
//! assert_eq!(fired[0].topic, "by/ll/oomon/garage/onoff/On-For");
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use super::config::{DEFAULT_CHECK_PERIOD, MonitorConfig};
use super::state::WatchedState;
use crate::error::{ConfigError, ReadingError, ScheduleError};
use crate::message::{MonitorEvent, ParsedTopic, Reading, ThresholdEntry};
use crate::types::Sentinels;

/// What happened to a reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingOutcome {
    /// The location is not watched; nothing was emitted.
    Ignored,
    /// The reading was applied.
    Accepted {
        /// The immediate On/Off mirror of the reading.
        event: MonitorEvent,
        /// Whether the location's value changed.
        transitioned: bool,
    },
}

/// All mutable state of one running monitor.
#[derive(Debug, Clone)]
pub struct MonitorInstance {
    watched: BTreeMap<String, WatchedState>,
    base_namespace: String,
    event_name: String,
    check_period: Duration,
    unknown_policy: i64,
    birth: i64,
    sentinels: Sentinels,
}

impl MonitorInstance {
    /// Creates an empty instance born at `birth` (epoch ms).
    ///
    /// A zero check period falls back to [`DEFAULT_CHECK_PERIOD`], so the
    /// "Since" ticker and the "Since" cutoff always agree.
    #[must_use]
    pub fn new(config: &MonitorConfig, birth: i64) -> Self {
        let mut check_period = config.check_period;
        if check_period.is_zero() {
            tracing::warn!(
                fallback = ?DEFAULT_CHECK_PERIOD,
                "Zero check period configured, using default"
            );
            check_period = DEFAULT_CHECK_PERIOD;
        }
        Self {
            watched: BTreeMap::new(),
            base_namespace: config.base_namespace.clone(),
            event_name: config.event_name.clone(),
            check_period,
            unknown_policy: config.unknown_policy,
            birth,
            sentinels: config.sentinels(),
        }
    }

    /// Starts watching a location, resetting it if it was already watched.
    pub fn register(&mut self, name: impl Into<String>) -> &WatchedState {
        let name = name.into();
        let state = WatchedState::new(name.clone(), self.birth, self.sentinels);
        if self.watched.insert(name.clone(), state).is_some() {
            tracing::debug!(location = %name, "Location registered again, state reset");
        } else {
            tracing::debug!(location = %name, "Watching location");
        }
        &self.watched[&name]
    }

    /// Adds a threshold to a registered location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnregisteredLocation`] if the location was
    /// never registered, or [`ConfigError::InvalidDuration`] if the duration
    /// text does not parse.
    pub fn add_threshold(&mut self, entry: &ThresholdEntry) -> Result<(), ConfigError> {
        let state = self
            .watched
            .get_mut(&entry.location)
            .ok_or_else(|| ConfigError::UnregisteredLocation(entry.location.clone()))?;
        let spec = state.add_threshold(&entry.duration)?;
        tracing::debug!(
            location = %entry.location,
            threshold = %spec.text(),
            "Threshold added"
        );
        Ok(())
    }

    /// Applies a reading received at `now` (epoch ms).
    ///
    /// The timestamp is taken from the topic's last segment, falling back to
    /// `now`. Every reading for a watched location yields an On/Off mirror
    /// event; a changed value also rebuilds that location's deadlines, after
    /// which the caller should re-arm its timer from [`Self::next_deadline`].
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::TooFewSegments`] if the topic is malformed.
    pub fn handle_reading(
        &mut self,
        reading: &Reading,
        now: i64,
    ) -> Result<ReadingOutcome, ReadingError> {
        let parsed = ParsedTopic::parse(&reading.topic)?;
        let Some(state) = self.watched.get_mut(parsed.location) else {
            tracing::trace!(topic = %reading.topic, "Ignoring reading for unwatched location");
            return Ok(ReadingOutcome::Ignored);
        };

        let when = parsed.timestamp.unwrap_or(now);
        let direction = state.sentinels().direction(reading.value);
        let transitioned = state.apply_value(reading.value, when);
        if transitioned {
            state.rebuild_remaining();
            tracing::debug!(
                location = %parsed.location,
                %direction,
                when,
                pending = state.remaining().len(),
                "State changed"
            );
        }

        let event = MonitorEvent::state(
            &self.base_namespace,
            parsed.location,
            &self.event_name,
            direction,
            when,
        );
        Ok(ReadingOutcome::Accepted {
            event,
            transitioned,
        })
    }

    /// The earliest pending deadline across all locations.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Exhausted`] if no location has a pending
    /// deadline.
    pub fn next_deadline(&self) -> Result<i64, ScheduleError> {
        self.watched
            .values()
            .filter_map(WatchedState::next_remaining)
            .min()
            .ok_or(ScheduleError::Exhausted)
    }

    /// Fires every deadline at or before `at`, returning one "For" event per
    /// fired threshold.
    pub fn fire_due(&mut self, at: i64) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        for (name, state) in &mut self.watched {
            let direction = state.direction();
            for text in state.expire(at) {
                tracing::debug!(location = %name, %direction, threshold = %text, "Threshold reached");
                events.push(MonitorEvent::for_threshold(
                    &self.base_namespace,
                    name,
                    &self.event_name,
                    direction,
                    text,
                ));
            }
        }
        events
    }

    /// Returns a "Since" event for every location that has been on or off
    /// for at least the check period at `at`.
    ///
    /// This is not deduplicated: a location keeps reporting on every check
    /// for as long as it holds its state.
    #[must_use]
    pub fn check_since(&self, at: i64) -> Vec<MonitorEvent> {
        let period = i64::try_from(self.check_period.as_millis()).unwrap_or(i64::MAX);
        let cutoff = at.saturating_sub(period);
        self.watched
            .iter()
            .filter_map(|(name, state)| {
                let (direction, reference) = state.since_reference()?;
                (reference <= cutoff).then(|| {
                    MonitorEvent::since(
                        &self.base_namespace,
                        name,
                        &self.event_name,
                        direction,
                        reference,
                    )
                })
            })
            .collect()
    }

    /// Looks up a watched location.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WatchedState> {
        self.watched.get(name)
    }

    /// Number of watched locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    /// Returns `true` if no location is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// The event name segment of output topics.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Cadence of the "Since" ticker.
    #[must_use]
    pub fn check_period(&self) -> Duration {
        self.check_period
    }

    /// The unknown-value policy code.
    #[must_use]
    pub fn unknown_policy(&self) -> i64 {
        self.unknown_policy
    }

    /// When this instance was created (epoch ms).
    #[must_use]
    pub fn birth(&self) -> i64 {
        self.birth
    }
}
