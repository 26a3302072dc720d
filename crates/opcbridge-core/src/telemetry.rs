// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Data-change telemetry: arrival rate, per-sample latency, delivery jitter.
//!
//! Notifications arrive from the session client's own delivery context, never
//! the actor worker, so the pipeline owns its state in two pieces: the
//! latency accumulator is atomic (written per sample on arrival, drained by
//! the periodic reporter), while the rate window and jitter tracker live
//! inside the single pump task and need no locking at all.
//!
//! Reports are one-way `tracing` emissions. The rate window is
//! notification-driven: the report fires when a batch arrives after the
//! window has elapsed, and a traffic gap produces no zero-rate report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::session::NotificationReceiver;
use crate::types::NotificationBatch;

/// Capacity of the observer broadcast channel. Lagging observers lose old
/// batches rather than block the pump.
const OBSERVER_CAPACITY: usize = 256;

// =============================================================================
// TelemetryConfig
// =============================================================================

/// Timing knobs for the telemetry pipeline.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Expected interval between data-change batches; jitter is deviation
    /// from this.
    pub expected_interval: Duration,

    /// Cadence of the periodic latency report.
    pub latency_report_interval: Duration,

    /// Length of the arrival-rate window.
    pub rate_window: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            expected_interval: Duration::from_millis(100),
            latency_report_interval: Duration::from_secs(1),
            rate_window: Duration::from_secs(1),
        }
    }
}

// =============================================================================
// LatencyAccumulator
// =============================================================================

/// Running latency sum and sample count, atomic because the notification
/// context writes while the reporter drains.
#[derive(Debug, Default)]
pub struct LatencyAccumulator {
    nanos: AtomicU64,
    samples: AtomicU64,
}

/// One drained latency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    /// Average per-sample latency over the window.
    pub average: Duration,
    /// Number of samples in the window.
    pub samples: u64,
}

impl LatencyAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one sample into the window.
    pub fn record(&self, latency: Duration) {
        self.nanos
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes the current window, resetting it to empty.
    ///
    /// Returns `None` when no samples arrived; an empty window is not
    /// reported.
    pub fn drain(&self) -> Option<LatencySummary> {
        let samples = self.samples.swap(0, Ordering::Relaxed);
        let nanos = self.nanos.swap(0, Ordering::Relaxed);
        if samples == 0 {
            return None;
        }
        Some(LatencySummary {
            average: Duration::from_nanos(nanos / samples),
            samples,
        })
    }

    /// Current sample count without draining.
    pub fn sample_count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }
}

// =============================================================================
// RateWindow
// =============================================================================

/// Counts data-change events within the current window.
///
/// Single-owner state: only the pump task touches it, so plain fields
/// suffice.
#[derive(Debug)]
pub struct RateWindow {
    window: Duration,
    started: Instant,
    events: u64,
}

/// One completed rate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSample {
    /// Events counted in the window, including the batch that closed it.
    pub events: u64,
    /// Actual elapsed length of the window.
    pub elapsed: Duration,
}

impl RateWindow {
    /// Creates a window starting now.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            started: Instant::now(),
            events: 0,
        }
    }

    /// Records `count` events arriving at `now`.
    ///
    /// The count is added before the boundary check, so the closing batch is
    /// part of the window it closes. Returns the completed window when the
    /// configured length has elapsed.
    pub fn record(&mut self, count: usize, now: Instant) -> Option<RateSample> {
        self.events += count as u64;
        let elapsed = now.duration_since(self.started);
        if elapsed < self.window {
            return None;
        }
        let sample = RateSample {
            events: self.events,
            elapsed,
        };
        self.events = 0;
        self.started = now;
        Some(sample)
    }
}

// =============================================================================
// JitterTracker
// =============================================================================

/// Measures delivery regularity: deviation of batch inter-arrival time from
/// the configured expected interval.
#[derive(Debug)]
pub struct JitterTracker {
    expected: Duration,
    last: Option<Instant>,
}

/// Jitter measurement for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterSample {
    /// Measured interval since the previous batch.
    pub interval: Duration,
    /// Signed deviation from the expected interval, in milliseconds.
    pub jitter_ms: f64,
}

impl JitterTracker {
    /// Creates a tracker with the given expected inter-batch interval.
    pub fn new(expected: Duration) -> Self {
        Self {
            expected,
            last: None,
        }
    }

    /// Observes a batch arrival. The first batch establishes the baseline
    /// and yields no sample.
    pub fn observe(&mut self, now: Instant) -> Option<JitterSample> {
        let sample = self.last.map(|last| {
            let interval = now.duration_since(last);
            JitterSample {
                interval,
                jitter_ms: interval.as_secs_f64() * 1_000.0 - self.expected.as_secs_f64() * 1_000.0,
            }
        });
        self.last = Some(now);
        sample
    }
}

// =============================================================================
// TelemetryPipeline
// =============================================================================

/// Consumes the notification stream, maintains the three aggregates, emits
/// periodic reports, and re-broadcasts batches to observers.
pub struct TelemetryPipeline {
    latency: Arc<LatencyAccumulator>,
    observers: broadcast::Sender<NotificationBatch>,
    batches: Arc<AtomicU64>,
    pump: Mutex<Option<JoinHandle<()>>>,
    reporter: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryPipeline {
    /// Spawns the pump and reporter tasks over the given notification
    /// stream.
    pub fn spawn(config: TelemetryConfig, receiver: NotificationReceiver) -> Self {
        let latency = Arc::new(LatencyAccumulator::new());
        let batches = Arc::new(AtomicU64::new(0));
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);

        let pump = tokio::spawn(Self::pump_loop(
            config.clone(),
            receiver,
            latency.clone(),
            batches.clone(),
            observers.clone(),
        ));
        let reporter = tokio::spawn(Self::report_loop(
            config.latency_report_interval,
            latency.clone(),
        ));

        Self {
            latency,
            observers,
            batches,
            pump: Mutex::new(Some(pump)),
            reporter: Mutex::new(Some(reporter)),
        }
    }

    async fn pump_loop(
        config: TelemetryConfig,
        mut receiver: NotificationReceiver,
        latency: Arc<LatencyAccumulator>,
        batches: Arc<AtomicU64>,
        observers: broadcast::Sender<NotificationBatch>,
    ) {
        let mut rate = RateWindow::new(config.rate_window);
        let mut jitter = JitterTracker::new(config.expected_interval);

        while let Some(batch) = receiver.recv().await {
            let now = Instant::now();
            let received_at = Utc::now();
            batches.fetch_add(1, Ordering::Relaxed);

            if let Some(sample) = jitter.observe(now) {
                debug!(
                    sequence = batch.sequence,
                    interval_ms = sample.interval.as_millis() as u64,
                    jitter_ms = sample.jitter_ms,
                    "notification interval"
                );
            }

            if let Some(sample) = rate.record(batch.len(), now) {
                info!(
                    events = sample.events,
                    window_ms = sample.elapsed.as_millis() as u64,
                    "data-change rate"
                );
            }

            for value in &batch.values {
                latency.record(value.latency_at(received_at));
            }

            // Observers are optional; send fails only when none exist.
            let _ = observers.send(batch);
        }

        debug!("notification stream closed, telemetry pump exiting");
    }

    async fn report_loop(interval: Duration, latency: Arc<LatencyAccumulator>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Some(summary) = latency.drain() {
                info!(
                    avg_latency_ms = summary.average.as_secs_f64() * 1_000.0,
                    samples = summary.samples,
                    "data-change latency"
                );
            }
        }
    }

    /// Subscribes an observer to the batch re-broadcast. A slow observer
    /// lags and drops old batches; it never blocks the pump.
    pub fn observe(&self) -> broadcast::Receiver<NotificationBatch> {
        self.observers.subscribe()
    }

    /// The shared latency accumulator.
    pub fn latency_accumulator(&self) -> &Arc<LatencyAccumulator> {
        &self.latency
    }

    /// Number of batches consumed so far.
    pub fn batches_received(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Stops the pump and reporter tasks. Idempotent.
    pub async fn stop(&self) {
        let handles = [self.reporter.lock().take(), self.pump.lock().take()];
        for handle in handles.into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for TelemetryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryPipeline")
            .field("batches", &self.batches_received())
            .field("pending_samples", &self.latency.sample_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
