// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Epoch-millisecond clock driven by the tokio timer.

use chrono::Utc;
use tokio::time::Instant;

/// Maps the tokio monotonic clock onto Unix epoch milliseconds.
///
/// The wall clock is read once, when the clock is anchored. After that,
/// time advances with [`tokio::time::Instant`], so deadlines computed in
/// epoch milliseconds line up exactly with tokio timers, including under
/// a paused test runtime.
///
/// # Examples
///
/// ```
/// use housemon_flow::monitor::Clock;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = Clock::anchored_at(1_000);
/// assert!(clock.now_ms() >= 1_000);
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
    origin_ms: i64,
}

impl Clock {
    /// Anchors the clock at the current wall-clock time.
    #[must_use]
    pub fn system() -> Self {
        Self::anchored_at(Utc::now().timestamp_millis())
    }

    /// Anchors the clock so that "now" reads as `epoch_ms`.
    #[must_use]
    pub fn anchored_at(epoch_ms: i64) -> Self {
        Self {
            origin: Instant::now(),
            origin_ms: epoch_ms,
        }
    }

    /// The current time in epoch milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_ms.saturating_add(elapsed)
    }

    /// The tokio instant corresponding to `epoch_ms`.
    ///
    /// Times before the anchor map to the anchor instant, which has already
    /// passed.
    #[must_use]
    pub fn instant_at(&self, epoch_ms: i64) -> Instant {
        let offset = epoch_ms.saturating_sub(self.origin_ms).max(0);
        self.origin + std::time::Duration::from_millis(offset.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn advances_with_tokio_time() {
        let clock = Clock::anchored_at(10_000);
        assert_eq!(clock.now_ms(), 10_000);

        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now_ms(), 12_500);
    }

    #[tokio::test(start_paused = true)]
    async fn instant_round_trips_with_now() {
        let clock = Clock::anchored_at(0);
        let deadline = clock.instant_at(30_000);

        tokio::time::sleep_until(deadline).await;
        assert_eq!(clock.now_ms(), 30_000);
    }

    #[tokio::test(start_paused = true)]
    async fn past_instants_clamp_to_anchor() {
        let clock = Clock::anchored_at(5_000);
        assert!(clock.instant_at(1_000) <= Instant::now());
    }

    #[test]
    fn system_clock_is_near_wall_clock() {
        let clock = Clock::system();
        let wall = Utc::now().timestamp_millis();
        assert!((wall - clock.now_ms()).abs() < 5_000);
    }
}
