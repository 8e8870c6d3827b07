// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Async runtime for the on/off monitor.
//!
//! The monitor runs as a single task that owns all of its state. It talks to
//! the rest of a circuit only through bounded channels:
//!
//! ```text
//!  params ─────┐
//!  filters ────┼─► drain until closed ─► MonitorInstance
//!  thresholds ─┘                              │
//!                                             ▼
//!  readings ───────────────────────► select! { For timer, Since ticker,
//!  shutdown ───────────────────────►           readings, shutdown } ──► events
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::clock::Clock;
use super::config::MonitorConfig;
use super::instance::{MonitorInstance, ReadingOutcome};
use crate::error::{ConfigError, Error, Result};
use crate::message::{MonitorEvent, Param, ParamEntry, Reading, ThresholdEntry};

/// Receiving ends of the monitor's four input feeds.
#[derive(Debug)]
pub struct MonitorFeeds {
    /// Global parameters. Drained until closed before readings are processed.
    pub params: mpsc::Receiver<ParamEntry>,
    /// Location names to watch. Drained until closed.
    pub filters: mpsc::Receiver<String>,
    /// Per-location thresholds. Drained until closed.
    pub thresholds: mpsc::Receiver<ThresholdEntry>,
    /// Live readings.
    pub readings: mpsc::Receiver<Reading>,
}

/// Sending ends of the monitor's four input feeds.
///
/// Drop `params`, `filters` and `thresholds` once configuration is complete;
/// the monitor does not start processing readings until they are closed or
/// the drain timeout elapses.
#[derive(Debug, Clone)]
pub struct MonitorInputs {
    /// Global parameters.
    pub params: mpsc::Sender<ParamEntry>,
    /// Location names to watch.
    pub filters: mpsc::Sender<String>,
    /// Per-location thresholds.
    pub thresholds: mpsc::Sender<ThresholdEntry>,
    /// Live readings.
    pub readings: mpsc::Sender<Reading>,
}

/// Creates bounded channels for every input feed.
///
/// # Examples
///
/// ```
/// use housemon_flow::monitor::monitor_channels;
///
/// let (inputs, feeds) = monitor_channels(32);
/// assert_eq!(inputs.readings.capacity(), 32);
/// # drop(feeds);
/// ```
#[must_use]
pub fn monitor_channels(capacity: usize) -> (MonitorInputs, MonitorFeeds) {
    let (params_tx, params_rx) = mpsc::channel(capacity);
    let (filters_tx, filters_rx) = mpsc::channel(capacity);
    let (thresholds_tx, thresholds_rx) = mpsc::channel(capacity);
    let (readings_tx, readings_rx) = mpsc::channel(capacity);

    (
        MonitorInputs {
            params: params_tx,
            filters: filters_tx,
            thresholds: thresholds_tx,
            readings: readings_tx,
        },
        MonitorFeeds {
            params: params_rx,
            filters: filters_rx,
            thresholds: thresholds_rx,
            readings: readings_rx,
        },
    )
}

/// Monitors on/off readings per location and emits time-based events.
///
/// # Examples
///
/// ```no_run
/// use housemon_flow::message::{ParamEntry, Reading, ThresholdEntry};
/// use housemon_flow::monitor::{MonitorConfig, OnOffMonitor, monitor_channels};
/// use tokio::sync::mpsc;
///
/// #[tokio::main]
/// async fn main() -> housemon_flow::Result<()> {
///     let (inputs, feeds) = monitor_channels(16);
///     let (out_tx, mut out_rx) = mpsc::channel(64);
///
///     let handle = OnOffMonitor::new(MonitorConfig::default()).spawn(feeds, out_tx);
///
///     inputs.params.send(ParamEntry::new("eventname", "motion")).await.ok();
///     inputs.filters.send("garage".to_string()).await.ok();
///     inputs.thresholds.send(ThresholdEntry::new("garage", "5m")).await.ok();
///     let readings = inputs.readings;
///     drop((inputs.params, inputs.filters, inputs.thresholds));
///
///     readings.send(Reading::new("sensor/garage/moved/1700000000000", 1.0)).await.ok();
///     if let Some(event) = out_rx.recv().await {
///         println!("{} {}", event.topic, event.payload);
///     }
///
///     handle.shutdown().await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OnOffMonitor {
    config: MonitorConfig,
    clock: Option<Clock>,
}

impl OnOffMonitor {
    /// Creates a monitor with the given starting configuration.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            clock: None,
        }
    }

    /// Uses an explicit clock instead of anchoring to the wall clock at
    /// startup.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Runs the monitor on a new task.
    ///
    /// Dropping the returned handle also stops the monitor.
    #[must_use]
    pub fn spawn(self, feeds: MonitorFeeds, out: mpsc::Sender<MonitorEvent>) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(feeds, out, shutdown_rx));
        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Runs the monitor until `shutdown` resolves.
    ///
    /// The shutdown signal fires when a value is sent or when its sender is
    /// dropped. Closing the reading feed does not stop the monitor; its
    /// timers keep running until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the output receiver is dropped.
    pub async fn run(
        self,
        mut feeds: MonitorFeeds,
        out: mpsc::Sender<MonitorEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        let clock = self.clock.unwrap_or_else(Clock::system);

        let configured = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            instance = configure(self.config, &mut feeds, clock) => Some(instance),
        };
        let Some(mut instance) = configured else {
            tracing::info!("Monitor stopped during configuration");
            return Ok(());
        };

        let check_period = instance.check_period();
        let mut since_ticker = tokio::time::interval_at(Instant::now() + check_period, check_period);
        since_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut for_deadline: Option<Instant> = None;
        let mut readings_open = true;

        tracing::info!(
            locations = instance.len(),
            event_name = %instance.event_name(),
            check_period = ?check_period,
            "Monitor started"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                () = wait_until(for_deadline) => {
                    let at = clock.now_ms();
                    for event in instance.fire_due(at) {
                        send(&out, event).await?;
                    }
                    for_deadline = next_for_deadline(&instance, clock);
                }

                _ = since_ticker.tick() => {
                    let at = clock.now_ms();
                    for event in instance.check_since(at) {
                        send(&out, event).await?;
                    }
                }

                reading = feeds.readings.recv(), if readings_open => {
                    let Some(reading) = reading else {
                        tracing::info!("Reading feed closed, timers keep running");
                        readings_open = false;
                        continue;
                    };
                    match instance.handle_reading(&reading, clock.now_ms()) {
                        Ok(ReadingOutcome::Accepted { event, transitioned }) => {
                            send(&out, event).await?;
                            if transitioned {
                                for_deadline = next_for_deadline(&instance, clock);
                            }
                        }
                        Ok(ReadingOutcome::Ignored) => {}
                        Err(e) => {
                            tracing::warn!(topic = %reading.topic, error = %e, "Dropping malformed reading");
                        }
                    }
                }
            }
        }

        tracing::info!("Monitor stopped");
        Ok(())
    }
}

/// Handle to a spawned monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MonitorHandle {
    /// Stops the monitor and waits for it to finish.
    ///
    /// Both timers stop and the output sender is dropped, so consumers see
    /// the output channel close.
    ///
    /// # Errors
    ///
    /// Returns the monitor's own error if it had already failed, or
    /// [`Error::TaskFailed`] if the task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?
    }

    /// Returns `true` if the monitor task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Drains the configuration feeds and builds the monitor state.
///
/// Feeds are drained concurrently, then applied in a fixed order: parameters,
/// filters, thresholds.
async fn configure(
    mut config: MonitorConfig,
    feeds: &mut MonitorFeeds,
    clock: Clock,
) -> MonitorInstance {
    let timeout = config.drain_timeout;
    let (params, filters, thresholds) = tokio::join!(
        drain(&mut feeds.params, "param", timeout),
        drain(&mut feeds.filters, "filter", timeout),
        drain(&mut feeds.thresholds, "threshold", timeout),
    );

    for entry in params {
        let key = entry.key.clone();
        match Param::try_from(entry) {
            Ok(param) => {
                tracing::debug!(key = param.key(), ?param, "Applying parameter");
                config.apply(param);
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Dropping parameter"),
        }
    }

    let mut instance = MonitorInstance::new(&config, clock.now_ms());
    for name in filters {
        instance.register(name);
    }
    for entry in thresholds {
        if let Err(e) = instance.add_threshold(&entry) {
            tracing::warn!(
                location = %entry.location,
                threshold = %entry.duration,
                error = %e,
                "Dropping threshold"
            );
        }
    }
    instance
}

/// Collects everything from `rx` until it closes or `timeout` elapses.
async fn drain<T>(rx: &mut mpsc::Receiver<T>, feed: &'static str, timeout: Duration) -> Vec<T> {
    let mut items = Vec::new();
    let collect = async {
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
    };
    if tokio::time::timeout(timeout, collect).await.is_err() {
        let e = ConfigError::DrainTimeout {
            feed,
            waited_ms: timeout.as_millis(),
        };
        tracing::warn!(error = %e, received = items.len(), "Proceeding with partial configuration");
    } else {
        tracing::debug!(feed, received = items.len(), "Feed drained");
    }
    items
}

/// Computes the next "For" timer instant, or `None` to leave it disarmed.
fn next_for_deadline(instance: &MonitorInstance, clock: Clock) -> Option<Instant> {
    match instance.next_deadline() {
        Ok(deadline) => {
            tracing::debug!(deadline, "For timer armed");
            Some(clock.instant_at(deadline))
        }
        Err(e) => {
            tracing::trace!(reason = %e, "For timer disarmed");
            None
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn send(out: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) -> Result<()> {
    tracing::trace!(topic = %event.topic, payload = %event.payload, "Emitting event");
    out.send(event)
        .await
        .map_err(|_| Error::ChannelClosed("monitor output".to_string()))
}
