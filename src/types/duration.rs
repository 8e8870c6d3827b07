// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Duration text in the format used by flow circuit definitions.
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a mandatory unit suffix, such as `"90s"`,
//! `"1m30s"`, `"1.5h"` or `"250ms"`. Valid units are `ns`, `us` (or `µs`),
//! `ms`, `s`, `m` and `h`. The bare string `"0"` is also accepted.
//!
//! [`format_duration`] produces the canonical spelling of a duration, which
//! is how equivalent inputs (`"90s"` and `"1m30s"`) are recognized as the
//! same threshold.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use housemon_flow::types::{format_duration, parse_duration};
//!
//! let d = parse_duration("90s").unwrap();
//! assert_eq!(d, Duration::from_secs(90));
//! assert_eq!(format_duration(d), "1m30s");
//! ```

use std::fmt::Write;
use std::time::Duration;

use crate::error::ConfigError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this precision cannot affect a nanosecond total.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses duration text such as `"2m30s"` into a [`Duration`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] if:
/// - The text is empty or negative
/// - A number is missing its unit, or the unit is unknown
/// - The total does not fit in 64 bits of nanoseconds
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidDuration {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = text.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, after_unit) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(&format!("unknown unit {unit:?}")))?;

        let whole = parse_digits(int_part).ok_or_else(|| invalid("number too large"))?;
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("number too large"))?;

        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
            let numerator = parse_digits(digits).ok_or_else(|| invalid("number too large"))?;
            let exponent = u32::try_from(digits.len()).unwrap_or(u32::MAX);
            nanos += numerator * scale / 10u128.pow(exponent);
        }

        total = total
            .checked_add(nanos)
            .filter(|t| *t <= u128::from(u64::MAX))
            .ok_or_else(|| invalid("duration overflows"))?;
        rest = after_unit;
    }

    // Bounded above by u64::MAX.
    Ok(Duration::from_nanos(u64::try_from(total).unwrap_or(u64::MAX)))
}

/// Formats a duration in its canonical spelling.
///
/// Durations under one second use the largest fitting sub-second unit
/// (`"1.5ms"`); longer ones are written as hours, minutes and seconds
/// (`"1h0m5.25s"`), omitting leading zero components.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use housemon_flow::types::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
/// assert_eq!(format_duration(Duration::ZERO), "0s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI, 6));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs_nanos = u128::from(total_secs % 60) * NANOS_PER_SEC + u128::from(duration.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", decimal(secs_nanos, NANOS_PER_SEC, 9));
    out
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn parse_digits(digits: &str) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Writes `value / unit` with the remainder as a trimmed decimal fraction.
fn decimal(value: u128, unit: u128, width: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
