// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests of the monitor task on a paused tokio clock.

use std::time::Duration;

use housemon_flow::message::{EventKind, MonitorEvent, ParamEntry, Payload, Reading, ThresholdEntry};
use housemon_flow::monitor::{Clock, MonitorConfig, MonitorHandle, OnOffMonitor, monitor_channels};
use housemon_flow::{Direction, Error};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};

/// Longer than anything a test waits for.
const PATIENCE: Duration = Duration::from_secs(6 * 3600);

struct Harness {
    readings: mpsc::Sender<Reading>,
    out: mpsc::Receiver<MonitorEvent>,
    handle: MonitorHandle,
    start: Instant,
}

impl Harness {
    async fn next(&mut self) -> MonitorEvent {
        timeout(PATIENCE, self.out.recv())
            .await
            .expect("no event before timeout")
            .expect("output channel closed")
    }

    async fn next_within(&mut self, limit: Duration) -> Option<MonitorEvent> {
        timeout(limit, self.out.recv()).await.ok().flatten()
    }

    async fn send(&self, topic: &str, value: f64) {
        self.readings
            .send(Reading::new(topic, value))
            .await
            .expect("monitor stopped");
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Spawns a default monitor anchored at epoch 0 with the configuration feeds
/// already filled and closed.
async fn start(params: Vec<ParamEntry>, filters: &[&str], thresholds: &[(&str, &str)]) -> Harness {
    start_with(MonitorConfig::default(), params, filters, thresholds).await
}

async fn start_with(
    config: MonitorConfig,
    params: Vec<ParamEntry>,
    filters: &[&str],
    thresholds: &[(&str, &str)],
) -> Harness {
    let (inputs, feeds) = monitor_channels(64);
    for param in params {
        inputs.params.send(param).await.unwrap();
    }
    for filter in filters {
        inputs.filters.send((*filter).to_string()).await.unwrap();
    }
    for (location, duration) in thresholds {
        inputs
            .thresholds
            .send(ThresholdEntry::new(*location, *duration))
            .await
            .unwrap();
    }
    let readings = inputs.readings;
    drop((inputs.params, inputs.filters, inputs.thresholds));

    let (out_tx, out) = mpsc::channel(64);
    let start = Instant::now();
    let handle = OnOffMonitor::new(config)
        .with_clock(Clock::anchored_at(0))
        .spawn(feeds, out_tx);

    Harness {
        readings,
        out,
        handle,
        start,
    }
}

fn quiet() -> Vec<ParamEntry> {
    vec![ParamEntry::new("checkperiod", "24h")]
}

// ============================================================================
// "For" events
// ============================================================================

mod thresholds {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_at_threshold_and_not_before() {
        let mut h = start(quiet(), &["garage"], &[("garage", "30s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;

        let mirror = h.next().await;
        assert_eq!(mirror.kind, EventKind::State);

        let fired = h.next().await;
        assert_eq!(fired.topic, "by/ll/oomon/garage/onoff/On-For");
        assert_eq!(fired.direction, Direction::On);
        assert_eq!(fired.payload, Payload::Duration("30s".to_string()));
        assert!(h.elapsed() >= Duration::from_secs(30));
        assert!(h.elapsed() < Duration::from_secs(31));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reports_original_spelling_in_order() {
        let mut h = start(quiet(), &["garage"], &[("garage", "90s"), ("garage", "1s")]).await;
        h.send("sensor/garage/moved/0", 0.0).await;
        h.next().await;

        let first = h.next().await;
        assert_eq!(first.topic, "by/ll/oomon/garage/onoff/Off-For");
        assert_eq!(first.payload, Payload::Duration("1s".to_string()));

        let second = h.next().await;
        assert_eq!(second.payload, Payload::Duration("90s".to_string()));
        assert!(h.elapsed() >= Duration::from_secs(90));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transition_replaces_pending_deadlines() {
        let mut h = start(quiet(), &["garage"], &[("garage", "30s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;
        h.next().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        h.send("sensor/garage/moved/10000", 0.0).await;
        let mirror = h.next().await;
        assert_eq!(mirror.direction, Direction::Off);

        // The On deadline at 30s is gone; Off fires 30s after the transition
        let fired = h.next().await;
        assert_eq!(fired.topic, "by/ll/oomon/garage/onoff/Off-For");
        assert!(h.elapsed() >= Duration::from_secs(40));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn rearms_after_exhaustion() {
        let mut h = start(quiet(), &["garage"], &[("garage", "10s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;
        h.next().await;
        assert_eq!(h.next().await.kind, EventKind::For);

        assert!(h.next_within(Duration::from_secs(600)).await.is_none());

        // No timestamp in the topic: the monitor's own clock is used
        h.send("sensor/garage/moved", 0.0).await;
        let mirror = h.next().await;
        let Payload::Timestamp(when) = mirror.payload else {
            panic!("mirror payload should be a timestamp");
        };
        assert!(when >= 610_000);

        let fired = h.next().await;
        assert_eq!(fired.topic, "by/ll/oomon/garage/onoff/Off-For");
        assert_eq!(fired.payload, Payload::Duration("10s".to_string()));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_threshold_follows_mirror() {
        let mut h = start(quiet(), &["garage"], &[("garage", "0s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;

        assert_eq!(h.next().await.kind, EventKind::State);
        assert_eq!(h.next().await.kind, EventKind::For);

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn bad_thresholds_are_dropped() {
        let mut h = start(
            quiet(),
            &["garage"],
            &[("garage", "soon"), ("attic", "5s"), ("garage", "5s")],
        )
        .await;
        h.send("sensor/garage/moved/0", 1.0).await;
        h.next().await;

        let fired = h.next().await;
        assert_eq!(fired.payload, Payload::Duration("5s".to_string()));
        assert!(h.next_within(Duration::from_secs(600)).await.is_none());

        h.handle.shutdown().await.unwrap();
    }
}

// ============================================================================
// "Since" events
// ============================================================================

mod since {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn repeats_every_period_with_same_reference() {
        let mut h = start(Vec::new(), &["hall"], &[]).await;
        h.send("sensor/hall/moved/0", 1.0).await;
        h.next().await;

        for round in 1..=3u64 {
            let event = h.next().await;
            assert_eq!(event.topic, "by/ll/oomon/hall/onoff/On-Since");
            assert_eq!(event.payload, Payload::Timestamp(0));
            assert!(h.elapsed() >= Duration::from_secs(20 * round));
            assert!(h.elapsed() < Duration::from_secs(20 * round + 1));
        }

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn honors_check_period_param() {
        let mut h = start(
            vec![ParamEntry::new("checkPeriod", "5s"), ParamEntry::new("eventname", "door")],
            &["hall"],
            &[],
        )
        .await;
        h.send("sensor/hall/contact/0", 0.0).await;
        h.next().await;

        let event = h.next().await;
        assert_eq!(event.topic, "by/ll/oomon/hall/door/Off-Since");
        assert!(h.elapsed() >= Duration::from_secs(5));
        assert!(h.elapsed() < Duration::from_secs(6));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_check_period_waits_a_full_default_period() {
        let config = MonitorConfig::new().with_check_period(Duration::ZERO);
        let mut h = start_with(config, Vec::new(), &["garage"], &[]).await;

        tokio::time::sleep(Duration::from_secs(19)).await;
        h.send("sensor/garage/moved/19000", 1.0).await;
        assert_eq!(h.next().await.payload, Payload::Timestamp(19_000));

        // The tick at 20s sees only 1s in state; the one at 40s reports
        let event = h.next().await;
        assert_eq!(event.topic, "by/ll/oomon/garage/onoff/On-Since");
        assert_eq!(event.payload, Payload::Timestamp(19_000));
        assert!(h.elapsed() >= Duration::from_secs(40));
        assert!(h.elapsed() < Duration::from_secs(41));

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn silent_until_first_reading() {
        let mut h = start(Vec::new(), &["hall"], &[]).await;
        assert!(h.next_within(Duration::from_secs(120)).await.is_none());
        h.handle.shutdown().await.unwrap();
    }
}

// ============================================================================
// Readings
// ============================================================================

mod readings {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn same_value_twice_mirrors_twice_and_keeps_deadline() {
        let mut h = start(quiet(), &["garage"], &[("garage", "10s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;
        h.send("sensor/garage/moved/5000", 1.0).await;

        let first = h.next().await;
        let second = h.next().await;
        assert_eq!(first.payload, Payload::Timestamp(0));
        assert_eq!(second.payload, Payload::Timestamp(5000));
        assert_eq!(second.topic, "by/ll/oomon/garage/onoff/On");

        let fired = h.next().await;
        assert_eq!(fired.kind, EventKind::For);
        assert!(h.elapsed() < Duration::from_secs(11));
        assert!(h.next_within(Duration::from_secs(600)).await.is_none());

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn invert_flips_directions() {
        let mut h = start(vec![ParamEntry::new("invert", true)], &["porch"], &[]).await;
        h.send("sensor/porch/light/0", 0.0).await;
        h.send("sensor/porch/light/1", 1.0).await;

        assert_eq!(h.next().await.topic, "by/ll/oomon/porch/onoff/On");
        assert_eq!(h.next().await.topic, "by/ll/oomon/porch/onoff/Off");

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unwatched_and_malformed_readings_emit_nothing() {
        let mut h = start(quiet(), &["garage"], &[]).await;
        h.send("sensor/attic/moved/0", 1.0).await;
        h.send("garage", 1.0).await;
        h.send("sensor/garage/moved/42", 1.0).await;

        let event = h.next().await;
        assert_eq!(event.location, "garage");
        assert_eq!(event.payload, Payload::Timestamp(42));
        assert!(h.next_within(Duration::from_secs(60)).await.is_none());
        assert!(!h.handle.is_finished());

        h.handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timers_survive_closed_reading_feed() {
        let h = start(quiet(), &["garage"], &[("garage", "15s")]).await;
        h.send("sensor/garage/moved/0", 1.0).await;
        let Harness {
            readings,
            mut out,
            handle,
            start,
        } = h;
        drop(readings);

        let mirror = timeout(PATIENCE, out.recv()).await.unwrap().unwrap();
        assert_eq!(mirror.kind, EventKind::State);
        let fired = timeout(PATIENCE, out.recv()).await.unwrap().unwrap();
        assert_eq!(fired.kind, EventKind::For);
        assert!(start.elapsed() >= Duration::from_secs(15));

        handle.shutdown().await.unwrap();
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_output() {
        let mut h = start(Vec::new(), &["garage"], &[]).await;
        h.send("sensor/garage/moved/0", 1.0).await;
        h.next().await;

        h.handle.shutdown().await.unwrap();
        assert!(h.out.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_output_stops_monitor_with_error() {
        let h = start(Vec::new(), &["garage"], &[]).await;
        let Harness {
            readings,
            out,
            handle,
            ..
        } = h;
        drop(out);
        readings
            .send(Reading::new("sensor/garage/moved/0", 1.0))
            .await
            .unwrap();

        for _ in 0..100 {
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.is_finished());
        assert!(matches!(handle.shutdown().await, Err(Error::ChannelClosed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn drain_timeout_bounds_startup() {
        let (inputs, feeds) = monitor_channels(8);
        inputs.filters.send("garage".to_string()).await.unwrap();
        // The filter feed is never closed
        let (out_tx, mut out) = mpsc::channel(8);
        let start = Instant::now();
        let handle = OnOffMonitor::new(
            MonitorConfig::new()
                .with_drain_timeout(Duration::from_secs(5))
                .with_check_period(Duration::from_secs(3600)),
        )
        .with_clock(Clock::anchored_at(0))
        .spawn(feeds, out_tx);
        drop((inputs.params, inputs.thresholds));

        inputs
            .readings
            .send(Reading::new("sensor/garage/moved/7", 1.0))
            .await
            .unwrap();

        let event = timeout(PATIENCE, out.recv()).await.unwrap().unwrap();
        assert_eq!(event.payload, Payload::Timestamp(7));
        assert!(start.elapsed() >= Duration::from_secs(5));

        handle.shutdown().await.unwrap();
        drop(inputs.filters);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_configuration() {
        let (inputs, feeds) = monitor_channels(8);
        let (out_tx, mut out) = mpsc::channel(8);
        let handle = OnOffMonitor::new(MonitorConfig::default()).spawn(feeds, out_tx);

        handle.shutdown().await.unwrap();
        assert!(out.recv().await.is_none());
        drop(inputs);
    }
}
