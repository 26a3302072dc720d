// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Bridge Integration Tests
//!
//! End-to-end tests of the assembled bridge:
//!
//! - `test_read_*` / `test_write_*`: synchronous caller surface over the actor
//! - `test_subscribe_*`: subscription and data-change delivery
//! - `test_shutdown_*`: ordered teardown
//! - `test_simulator_*`: the full loop over the simulated session

use std::sync::Arc;
use std::time::Duration;

use opcbridge_core::{
    ActorError, Bridge, BridgeError, SessionError, TagId, Value,
};
use opcbridge_sim::SimulatorSession;
use opcbridge_tests::common::fixtures::{BatchFixtures, ConfigFixtures, TagFixtures};
use opcbridge_tests::common::mocks::MockSession;

fn mock_bridge(mock: &MockSession) -> Bridge {
    Bridge::start(mock.boxed(), ConfigFixtures::fast_bridge())
}

// =============================================================================
// Reads and writes
// =============================================================================

#[tokio::test]
async fn test_read_distinguishes_not_found_from_error() {
    let mock = MockSession::new();
    mock.set_value(TagId::new("boiler.temp"), Value::Float64(88.5));
    let bridge = mock_bridge(&mock);

    let found = bridge.read_tag(TagId::new("boiler.temp")).await.unwrap();
    assert_eq!(found.unwrap().value, Value::Float64(88.5));

    // Unknown tag is Ok(None), not an error.
    let missing = bridge.read_tag(TagId::new("no.such.tag")).await.unwrap();
    assert!(missing.is_none());

    // A transport failure is an error, not None.
    mock.fail_next_read();
    let failed = bridge.read_tag(TagId::new("boiler.temp")).await;
    assert!(matches!(
        failed,
        Err(BridgeError::Session(SessionError::ReadFailed { .. }))
    ));

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_write_propagates_failure_to_its_caller_only() {
    let mock = MockSession::new();
    let bridge = mock_bridge(&mock);

    bridge
        .write_tag(TagId::new("pump.speed"), Value::Float64(1_200.0))
        .await
        .unwrap();

    mock.fail_all_writes();
    let failed = bridge
        .write_tag(TagId::new("pump.speed"), Value::Float64(1_500.0))
        .await;
    assert!(matches!(
        failed,
        Err(BridgeError::Session(SessionError::WriteFailed { .. }))
    ));

    // The worker survived; a read still goes through.
    let value = bridge.read_tag(TagId::new("pump.speed")).await.unwrap();
    assert_eq!(value.unwrap().value, Value::Float64(1_200.0));

    bridge.shutdown().await;
}

// =============================================================================
// Subscriptions and delivery
// =============================================================================

#[tokio::test]
async fn test_subscribe_creates_group_and_delivers_batches() {
    let mock = MockSession::new();
    let bridge = mock_bridge(&mock);
    let mut observer = bridge.observe_changes();

    let count = bridge
        .subscribe_tags(TagFixtures::process_tags())
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(mock.group_creations(), 1);
    assert!(mock.has_notification_channel());

    mock.push_batch(BatchFixtures::of_size(1, 3));
    let batch = tokio::time::timeout(Duration::from_secs(1), observer.recv())
        .await
        .expect("batch delivered")
        .unwrap();
    assert_eq!(batch.len(), 3);

    // Telemetry saw the same batch.
    assert_eq!(bridge.telemetry().batches_received(), 1);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_subscribe_twice_keeps_one_group() {
    let mock = MockSession::new();
    let bridge = mock_bridge(&mock);

    bridge.subscribe_tags(vec![TagId::new("a")]).await.unwrap();
    bridge.subscribe_tags(vec![TagId::new("b")]).await.unwrap();

    assert_eq!(mock.group_creations(), 1);
    assert_eq!(bridge.subscriptions().groups_created(), 1);

    bridge.shutdown().await;
}

// =============================================================================
// Shutdown ordering
// =============================================================================

#[tokio::test]
async fn test_shutdown_drains_queue_then_tears_down() {
    let mock = MockSession::new();
    mock.set_write_delay(Duration::from_millis(30));
    let bridge = Arc::new(mock_bridge(&mock));

    let mut writers = Vec::new();
    for i in 0..3 {
        let bridge = bridge.clone();
        writers.push(tokio::spawn(async move {
            bridge
                .write_tag(TagId::new(format!("slow.{i}")), Value::Int32(i))
                .await
        }));
    }
    // Let the writes reach the queue before shutdown begins.
    tokio::time::sleep(Duration::from_millis(10)).await;

    bridge.shutdown().await;

    for writer in writers {
        writer.await.unwrap().unwrap();
    }
    assert_eq!(mock.write_count(), 3);
    assert_eq!(mock.disconnect_count(), 1);

    // Every write executed before the teardown's disconnect.
    let events = mock.events();
    let disconnect = events.iter().position(|e| e == "disconnect").unwrap();
    for (i, event) in events.iter().enumerate() {
        if event.starts_with("write:") {
            assert!(i < disconnect, "write after disconnect: {event}");
        }
    }
}

#[tokio::test]
async fn test_shutdown_rejects_new_work() {
    let mock = MockSession::new();
    let bridge = mock_bridge(&mock);

    bridge.shutdown().await;

    let late = bridge.read_tag(TagId::new("any")).await;
    assert!(matches!(
        late,
        Err(BridgeError::Actor(
            ActorError::ShuttingDown | ActorError::Closed
        ))
    ));
}

#[tokio::test]
async fn test_shutdown_tears_down_subscription_before_disconnect() {
    let mock = MockSession::new();
    let bridge = mock_bridge(&mock);

    bridge
        .subscribe_tags(TagFixtures::process_tags())
        .await
        .unwrap();
    bridge.shutdown().await;

    let events = mock.events();
    let dispose = events.iter().position(|e| e == "group_dispose").unwrap();
    let disconnect = events.iter().position(|e| e == "disconnect").unwrap();
    assert!(dispose < disconnect);
    assert!(!mock.has_notification_channel());
}

// =============================================================================
// Full loop over the simulator
// =============================================================================

#[tokio::test]
async fn test_simulator_full_loop() {
    let bridge = Bridge::start(
        Box::new(SimulatorSession::new()),
        ConfigFixtures::fast_bridge(),
    );
    let mut observer = bridge.observe_changes();

    let count = bridge
        .subscribe_tags(vec![
            TagId::new("sim.temperature"),
            TagId::new("sim.pressure"),
        ])
        .await
        .unwrap();
    assert_eq!(count, 2);

    // The simulator's emitter produces real change batches.
    let batch = tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .expect("simulator emitted")
        .unwrap();
    assert!(!batch.is_empty());
    assert!(batch.values.iter().all(|v| v.is_good()));

    // Writes round-trip through the actor into the simulator table.
    bridge
        .write_tag(TagId::new("sim.setpoint"), Value::Float64(42.0))
        .await
        .unwrap();
    let read_back = bridge.read_tag(TagId::new("sim.setpoint")).await.unwrap();
    assert_eq!(read_back.unwrap().value, Value::Float64(42.0));

    assert!(bridge.telemetry().batches_received() >= 1);
    bridge.shutdown().await;
}
