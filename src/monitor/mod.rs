// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The temporal on/off state monitor.
//!
//! The monitor turns a stream of on/off readings, keyed by location, into
//! time-based events:
//!
//! - `On` / `Off` - mirrored for every accepted reading
//! - `On-Since` / `Off-Since` - periodically, while a location holds its
//!   state for at least the check period
//! - `On-For` / `Off-For` - once per configured threshold after each
//!   transition
//!
//! # Architecture
//!
//! - [`MonitorInstance`] - state table and deadline scheduler, synchronous
//! - [`WatchedState`] - per-location transition times and deadline queue
//! - [`OnOffMonitor`] - async task that drains configuration, then
//!   multiplexes readings, timers and shutdown
//! - [`Clock`] - epoch milliseconds driven by the tokio timer

mod clock;
mod config;
mod instance;
mod runner;
mod state;

pub use clock::Clock;
pub use config::{
    DEFAULT_BASE_NAMESPACE, DEFAULT_CHECK_PERIOD, DEFAULT_DRAIN_TIMEOUT, DEFAULT_EVENT_NAME,
    DEFAULT_UNKNOWN_POLICY, MonitorConfig,
};
pub use instance::{MonitorInstance, ReadingOutcome};
pub use runner::{MonitorFeeds, MonitorHandle, MonitorInputs, OnOffMonitor, monitor_channels};
pub use state::{ThresholdSpec, WatchedState};
