// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-location state tracked by the monitor.
//!
//! A [`WatchedState`] records when its location last turned on and off, the
//! value it currently holds, the thresholds configured for it and the
//! queue of absolute deadlines at which those thresholds fire.
//!
//! # Examples
//!
//! ```
//! use housemon_flow::monitor::WatchedState;
//! use housemon_flow::types::Sentinels;
//!
//! let mut state = WatchedState::new("garage", 0, Sentinels::default());
//! state.add_threshold("10s").unwrap();
//! state.add_threshold("25s").unwrap();
//!
//! // Turning on at t=100s schedules both thresholds from that instant
//! assert!(state.apply_value(1.0, 100_000));
//! state.rebuild_remaining();
//! assert_eq!(state.remaining(), &[110_000, 125_000]);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{Direction, Sentinels, format_duration, parse_duration, same_code};

/// A threshold duration together with the text it was configured with.
///
/// The text is kept so "For" events report the user's own spelling
/// (`"90s"` rather than `"1m30s"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSpec {
    duration: Duration,
    text: String,
}

impl ThresholdSpec {
    /// Parses threshold text.
    ///
    /// Deadlines have millisecond resolution, so any sub-millisecond part
    /// of the duration is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if the text is not a valid
    /// duration.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let parsed = parse_duration(text)?;
        let millis = u64::try_from(parsed.as_millis()).unwrap_or(u64::MAX);
        Ok(Self {
            duration: Duration::from_millis(millis),
            text: text.to_string(),
        })
    }

    /// The threshold duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The text as originally supplied.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The canonical key equivalent spellings share.
    #[must_use]
    pub fn key(&self) -> String {
        format_duration(self.duration)
    }

    fn millis(&self) -> i64 {
        i64::try_from(self.duration.as_millis()).unwrap_or(i64::MAX)
    }
}

/// State of one watched location.
#[derive(Debug, Clone)]
pub struct WatchedState {
    name: String,
    last_on: i64,
    last_off: i64,
    current: f64,
    thresholds: BTreeMap<String, ThresholdSpec>,
    remaining: Vec<i64>,
    sentinels: Sentinels,
}

impl WatchedState {
    /// Creates a state in the unknown value, with both transition times set
    /// to `created_at`.
    #[must_use]
    pub fn new(name: impl Into<String>, created_at: i64, sentinels: Sentinels) -> Self {
        Self {
            name: name.into(),
            last_on: created_at,
            last_off: created_at,
            current: sentinels.unknown(),
            thresholds: BTreeMap::new(),
            remaining: Vec::new(),
            sentinels,
        }
    }

    /// The location name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the location last turned on (epoch ms).
    #[must_use]
    pub fn last_on(&self) -> i64 {
        self.last_on
    }

    /// When the location last turned off (epoch ms).
    #[must_use]
    pub fn last_off(&self) -> i64 {
        self.last_off
    }

    /// The value currently held.
    #[must_use]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// The sentinel codes this state was created with.
    #[must_use]
    pub fn sentinels(&self) -> Sentinels {
        self.sentinels
    }

    /// Thresholds keyed by their canonical text.
    #[must_use]
    pub fn thresholds(&self) -> &BTreeMap<String, ThresholdSpec> {
        &self.thresholds
    }

    /// Pending deadlines, ascending.
    #[must_use]
    pub fn remaining(&self) -> &[i64] {
        &self.remaining
    }

    /// The direction of the current value.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.sentinels.direction(self.current)
    }

    /// The transition time deadlines are measured from: the last "on" time
    /// while on, the last "off" time otherwise.
    #[must_use]
    pub fn reference_timestamp(&self) -> i64 {
        if self.sentinels.is_on(self.current) {
            self.last_on
        } else {
            self.last_off
        }
    }

    /// The direction and reference time for a "Since" check, if the
    /// location is exactly on or off.
    #[must_use]
    pub fn since_reference(&self) -> Option<(Direction, i64)> {
        if self.sentinels.is_on(self.current) {
            Some((Direction::On, self.last_on))
        } else if self.sentinels.is_off(self.current) {
            Some((Direction::Off, self.last_off))
        } else {
            None
        }
    }

    /// Adds a threshold. Equivalent spellings replace each other.
    ///
    /// The deadline queue is not touched; it picks the threshold up on the
    /// next transition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if the text is not a valid
    /// duration.
    pub fn add_threshold(&mut self, text: &str) -> Result<&ThresholdSpec, ConfigError> {
        let spec = ThresholdSpec::parse(text)?;
        let key = spec.key();
        self.thresholds.insert(key.clone(), spec);
        Ok(&self.thresholds[&key])
    }

    /// Records a reading value observed at `when`.
    ///
    /// Returns `true` if the value differs from the current one. Only the
    /// on and off codes update their transition times; any other value is
    /// held as current without touching either.
    pub fn apply_value(&mut self, value: f64, when: i64) -> bool {
        if same_code(self.current, value) {
            return false;
        }
        self.current = value;
        if self.sentinels.is_off(value) {
            self.last_off = when;
        }
        if self.sentinels.is_on(value) {
            self.last_on = when;
        }
        true
    }

    /// Replaces the deadline queue with one deadline per threshold, measured
    /// from the reference timestamp.
    pub fn rebuild_remaining(&mut self) {
        let reference = self.reference_timestamp();
        let mut remaining = Vec::with_capacity(self.thresholds.len());
        for spec in self.thresholds.values() {
            insert_sorted(&mut remaining, reference.saturating_add(spec.millis()));
        }
        self.remaining = remaining;
    }

    /// The earliest pending deadline.
    #[must_use]
    pub fn next_remaining(&self) -> Option<i64> {
        self.remaining.first().copied()
    }

    /// Removes every deadline at or before `now` and returns the original
    /// text of each threshold that fired.
    pub fn expire(&mut self, now: i64) -> Vec<String> {
        let due = self.remaining.partition_point(|deadline| *deadline <= now);
        if due == 0 {
            return Vec::new();
        }

        let reference = self.reference_timestamp();
        let fired: Vec<i64> = self.remaining.drain(..due).collect();
        fired
            .into_iter()
            .filter_map(|deadline| {
                let elapsed = u64::try_from(deadline.saturating_sub(reference)).ok()?;
                let key = format_duration(Duration::from_millis(elapsed));
                let spec = self.thresholds.get(&key);
                if spec.is_none() {
                    tracing::trace!(
                        location = %self.name,
                        deadline,
                        key = %key,
                        "Deadline matches no configured threshold"
                    );
                }
                spec.map(|s| s.text.clone())
            })
            .collect()
    }
}

/// Inserts `deadline` into an ascending queue, after any equal deadlines.
pub(crate) fn insert_sorted(queue: &mut Vec<i64>, deadline: i64) {
    let index = queue.partition_point(|existing| *existing <= deadline);
    queue.insert(index, deadline);
}
