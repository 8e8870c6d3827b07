// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sentinel codes and the On/Off direction derived from them.

use std::fmt;

/// The direction reported in output topics.
///
/// Anything that is not the "on" sentinel reports as [`Direction::Off`].
///
/// # Examples
///
/// ```
/// use housemon_flow::types::Direction;
///
/// assert_eq!(Direction::On.as_str(), "On");
/// assert_eq!(Direction::Off.to_string(), "Off");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Direction {
    /// The location is on.
    On,
    /// The location is off, or in an unrecognized state.
    Off,
}

impl Direction {
    /// Returns the topic segment for this direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three numeric codes a reading value is compared against.
///
/// Readings carry `1` for on and `0` for off by default. Inverting swaps the
/// two so sensors that report active-low can be monitored without touching
/// the state logic.
///
/// # Examples
///
/// ```
/// use housemon_flow::types::{Direction, Sentinels};
///
/// let normal = Sentinels::default();
/// assert_eq!(normal.direction(1.0), Direction::On);
///
/// let inverted = normal.inverted();
/// assert_eq!(inverted.direction(0.0), Direction::On);
/// assert_eq!(inverted.direction(1.0), Direction::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentinels {
    on: f64,
    off: f64,
    unknown: f64,
}

impl Sentinels {
    /// Creates sentinels from explicit codes.
    #[must_use]
    pub const fn new(on: f64, off: f64, unknown: f64) -> Self {
        Self { on, off, unknown }
    }

    /// Returns a copy with the on and off codes swapped.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            on: self.off,
            off: self.on,
            unknown: self.unknown,
        }
    }

    /// The "on" code.
    #[must_use]
    pub const fn on(&self) -> f64 {
        self.on
    }

    /// The "off" code.
    #[must_use]
    pub const fn off(&self) -> f64 {
        self.off
    }

    /// The code a location holds before its first reading.
    #[must_use]
    pub const fn unknown(&self) -> f64 {
        self.unknown
    }

    /// Returns `true` if `value` is exactly the "on" code.
    #[must_use]
    pub fn is_on(&self, value: f64) -> bool {
        same_code(value, self.on)
    }

    /// Returns `true` if `value` is exactly the "off" code.
    #[must_use]
    pub fn is_off(&self, value: f64) -> bool {
        same_code(value, self.off)
    }

    /// Maps a value onto the direction reported in topics.
    #[must_use]
    pub fn direction(&self, value: f64) -> Direction {
        if self.is_on(value) {
            Direction::On
        } else {
            Direction::Off
        }
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self::new(1.0, 0.0, -1.0)
    }
}

/// Sentinel codes are exact small integers, so bitwise equality is intended.
#[allow(clippy::float_cmp)]
pub(crate) fn same_code(a: f64, b: f64) -> bool {
    a == b
}
