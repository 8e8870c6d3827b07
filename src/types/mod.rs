// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the monitor.
//!
//! # Types
//!
//! - [`Direction`] - On/Off as reported in output topics
//! - [`Sentinels`] - The on/off/unknown codes, optionally inverted
//! - [`parse_duration`] / [`format_duration`] - Duration text such as `"1m30s"`

mod duration;
mod sentinel;

pub use duration::{format_duration, parse_duration};
pub use sentinel::{Direction, Sentinels};
pub(crate) use sentinel::same_code;
