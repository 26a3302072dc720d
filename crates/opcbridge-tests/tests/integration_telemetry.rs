// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Telemetry Pipeline Integration Tests
//!
//! - `test_latency_*`: latency window accumulation and empty-window behavior
//! - `test_rate_*`: notification-driven rate window
//! - `test_jitter_*`: inter-arrival deviation from the expected interval
//! - `test_pipeline_*`: the assembled pipeline over a live channel

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use opcbridge_core::{JitterTracker, RateWindow, TelemetryConfig, TelemetryPipeline};
use opcbridge_tests::common::fixtures::BatchFixtures;

/// Config with the periodic reporter effectively parked, so tests drain the
/// accumulator themselves.
fn manual_drain_config() -> TelemetryConfig {
    TelemetryConfig {
        expected_interval: Duration::from_millis(100),
        latency_report_interval: Duration::from_secs(3600),
        rate_window: Duration::from_secs(1),
    }
}

// =============================================================================
// Latency window
// =============================================================================

#[tokio::test]
async fn test_latency_window_average_and_count() {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = TelemetryPipeline::spawn(manual_drain_config(), rx);
    let mut observer = pipeline.observe();

    tx.send(BatchFixtures::with_latencies_ms(1, &[10, 20, 30]))
        .unwrap();
    observer.recv().await.unwrap();

    let summary = pipeline
        .latency_accumulator()
        .drain()
        .expect("three samples in the window");
    assert_eq!(summary.samples, 3);
    // Nominal average is 20ms; receipt happens a hair after the timestamps
    // were minted, so allow a small upward margin.
    assert!(summary.average >= Duration::from_millis(20));
    assert!(summary.average < Duration::from_millis(60));

    // The next window saw no samples and must not report.
    assert!(pipeline.latency_accumulator().drain().is_none());

    drop(tx);
    pipeline.stop().await;
}

#[tokio::test]
async fn test_latency_empty_window_produces_no_summary() {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = TelemetryPipeline::spawn(manual_drain_config(), rx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pipeline.latency_accumulator().drain().is_none());
    assert_eq!(pipeline.batches_received(), 0);

    drop(tx);
    pipeline.stop().await;
}

// =============================================================================
// Rate window
// =============================================================================

#[test]
fn test_rate_window_reports_42_events() {
    let mut rate = RateWindow::new(Duration::from_secs(1));
    let start = Instant::now();

    // 41 arrivals inside the window, then one past the boundary.
    for i in 1..=41u64 {
        assert!(rate
            .record(1, start + Duration::from_millis(20 * i))
            .is_none());
    }
    let sample = rate
        .record(1, start + Duration::from_millis(1_050))
        .expect("boundary arrival closes the window");

    assert_eq!(sample.events, 42);
}

#[test]
fn test_rate_window_silent_gap_reports_nothing() {
    let mut rate = RateWindow::new(Duration::from_secs(1));

    // No arrivals, no report, however much time passes. Only the next
    // arrival can close the window.
    let later = Instant::now() + Duration::from_secs(10);
    let sample = rate.record(3, later).expect("first arrival after the gap");
    assert_eq!(sample.events, 3);
}

// =============================================================================
// Jitter
// =============================================================================

#[test]
fn test_jitter_measures_deviation() {
    let mut jitter = JitterTracker::new(Duration::from_millis(100));
    let start = Instant::now();

    assert!(jitter.observe(start).is_none(), "first batch is baseline");

    let late = jitter
        .observe(start + Duration::from_millis(140))
        .expect("second batch");
    assert_eq!(late.interval, Duration::from_millis(140));
    assert!((late.jitter_ms - 40.0).abs() < 0.5);

    let early = jitter
        .observe(start + Duration::from_millis(210))
        .expect("third batch");
    assert_eq!(early.interval, Duration::from_millis(70));
    assert!((early.jitter_ms + 30.0).abs() < 0.5);
}

// =============================================================================
// Assembled pipeline
// =============================================================================

#[tokio::test]
async fn test_pipeline_counts_batches_and_samples() {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = TelemetryPipeline::spawn(manual_drain_config(), rx);
    let mut observer = pipeline.observe();

    for seq in 0..42 {
        tx.send(BatchFixtures::of_size(seq, 1)).unwrap();
    }
    for _ in 0..42 {
        observer.recv().await.unwrap();
    }

    assert_eq!(pipeline.batches_received(), 42);
    let summary = pipeline.latency_accumulator().drain().unwrap();
    assert_eq!(summary.samples, 42);

    drop(tx);
    pipeline.stop().await;
}

#[tokio::test]
async fn test_pipeline_fans_out_to_multiple_observers() {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = TelemetryPipeline::spawn(manual_drain_config(), rx);
    let mut first = pipeline.observe();
    let mut second = pipeline.observe();

    tx.send(BatchFixtures::of_size(7, 2)).unwrap();

    assert_eq!(first.recv().await.unwrap().sequence, 7);
    assert_eq!(second.recv().await.unwrap().sequence, 7);

    drop(tx);
    pipeline.stop().await;
}

#[tokio::test]
async fn test_pipeline_periodic_reporter_drains() {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = TelemetryPipeline::spawn(
        TelemetryConfig {
            latency_report_interval: Duration::from_millis(30),
            ..manual_drain_config()
        },
        rx,
    );
    let mut observer = pipeline.observe();

    tx.send(BatchFixtures::with_latencies_ms(1, &[15])).unwrap();
    observer.recv().await.unwrap();

    // The reporter's next tick consumes the window.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pipeline.latency_accumulator().sample_count(), 0);

    drop(tx);
    pipeline.stop().await;
}
