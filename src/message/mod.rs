// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages flowing into and out of the monitor.
//!
//! Inputs are closed types rather than loosely typed tags:
//!
//! - [`ParamEntry`] / [`Param`] - global parameters
//! - [`ThresholdEntry`] - per-location threshold durations
//! - [`Reading`] - live sensor readings, parsed with [`ParsedTopic`]
//!
//! Every output is a [`MonitorEvent`].

mod config;
mod event;
mod reading;

pub use config::{ConfigValue, Param, ParamEntry, ThresholdEntry};
pub use event::{EventKind, MonitorEvent, Payload};
pub use reading::{ParsedTopic, Reading};
