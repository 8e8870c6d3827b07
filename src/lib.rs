// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `housemon_flow` - time-aware on/off monitoring for flow-based
//! home-automation circuits.
//!
//! Sensors such as motion detectors and reed switches report `0`/`1` values
//! on topics like `sensor/garage/moved/<timestamp>`. The [`OnOffMonitor`]
//! watches a chosen set of locations and emits derived events that can be
//! published back onto a pub/sub transport:
//!
//! ```text
//! by/ll/oomon/garage/motion/On           1700000000000
//! by/ll/oomon/garage/motion/On-Since     1700000000000
//! by/ll/oomon/garage/motion/On-For       "5m"
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use housemon_flow::message::{Reading, ThresholdEntry};
//! use housemon_flow::{MonitorConfig, OnOffMonitor, monitor_channels};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> housemon_flow::Result<()> {
//!     let (inputs, feeds) = monitor_channels(16);
//!     let (out_tx, mut out_rx) = mpsc::channel(64);
//!
//!     let config = MonitorConfig::new().with_event_name("motion");
//!     let handle = OnOffMonitor::new(config).spawn(feeds, out_tx);
//!
//!     // Configuration feeds are drained until closed
//!     inputs.filters.send("garage".to_string()).await.ok();
//!     inputs.thresholds.send(ThresholdEntry::new("garage", "5m")).await.ok();
//!     let readings = inputs.readings;
//!     drop((inputs.params, inputs.filters, inputs.thresholds));
//!
//!     readings.send(Reading::new("sensor/garage/moved/1700000000000", 1.0)).await.ok();
//!
//!     if let Some(event) = out_rx.recv().await {
//!         println!("{} {}", event.topic, event.payload);
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```

pub mod error;
pub mod message;
pub mod monitor;
pub mod types;

pub use error::{ConfigError, Error, ReadingError, Result, ScheduleError};
pub use message::{MonitorEvent, Payload, Reading};
pub use monitor::{MonitorConfig, MonitorHandle, OnOffMonitor, monitor_channels};
pub use types::{Direction, Sentinels};
