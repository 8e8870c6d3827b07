// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor configuration.

use std::time::Duration;

use crate::message::Param;
use crate::types::Sentinels;

/// Default namespace prefixed to every output topic.
pub const DEFAULT_BASE_NAMESPACE: &str = "by/ll/oomon";

/// Default event name segment of output topics.
pub const DEFAULT_EVENT_NAME: &str = "onoff";

/// Default cadence of the "Since" ticker.
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(20);

/// Default limit on how long each configuration feed may stay open.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default unknown-value policy code.
pub const DEFAULT_UNKNOWN_POLICY: i64 = -1;

/// Configuration for an [`OnOffMonitor`](super::OnOffMonitor).
///
/// Values set here are starting points; entries on the parameter feed
/// override them.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use housemon_flow::monitor::MonitorConfig;
///
/// let config = MonitorConfig::new()
///     .with_event_name("motion")
///     .with_check_period(Duration::from_secs(60))
///     .with_inverted(true);
///
/// assert_eq!(config.event_name, "motion");
/// assert!(config.sentinels().is_on(0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Prefix of every output topic.
    pub base_namespace: String,
    /// Event name segment of output topics.
    pub event_name: String,
    /// Cadence of the "Since" ticker.
    pub check_period: Duration,
    /// Whether on and off codes are swapped.
    pub invert: bool,
    /// Unknown-value policy code, retained but not acted upon.
    pub unknown_policy: i64,
    /// How long each configuration feed may stay open before startup proceeds.
    pub drain_timeout: Duration,
}

impl MonitorConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output topic namespace.
    #[must_use]
    pub fn with_base_namespace(mut self, base: impl Into<String>) -> Self {
        self.base_namespace = base.into();
        self
    }

    /// Sets the event name segment.
    #[must_use]
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    /// Sets the "Since" ticker cadence.
    #[must_use]
    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period = period;
        self
    }

    /// Swaps the on and off codes.
    #[must_use]
    pub fn with_inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Sets the unknown-value policy code.
    #[must_use]
    pub fn with_unknown_policy(mut self, policy: i64) -> Self {
        self.unknown_policy = policy;
        self
    }

    /// Sets the configuration drain timeout.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Applies a parameter from the parameter feed.
    pub fn apply(&mut self, param: Param) {
        match param {
            Param::Invert(invert) => self.invert = invert,
            Param::EventName(name) => self.event_name = name,
            Param::Unknown(policy) => self.unknown_policy = policy,
            Param::CheckPeriod(period) => self.check_period = period,
        }
    }

    /// The sentinel codes implied by the invert flag.
    #[must_use]
    pub fn sentinels(&self) -> Sentinels {
        if self.invert {
            Sentinels::default().inverted()
        } else {
            Sentinels::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_namespace: DEFAULT_BASE_NAMESPACE.to_string(),
            event_name: DEFAULT_EVENT_NAME.to_string(),
            check_period: DEFAULT_CHECK_PERIOD,
            invert: false,
            unknown_policy: DEFAULT_UNKNOWN_POLICY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
