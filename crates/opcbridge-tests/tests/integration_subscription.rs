// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Subscription Manager Integration Tests
//!
//! - `test_ensure_*`: idempotent group creation, including under concurrency
//! - `test_subscribe_*`: tag subscription through the manager
//! - `test_teardown_*`: teardown isolation and re-creation

use std::sync::Arc;

use tokio::sync::mpsc;

use opcbridge_core::{GroupConfig, SessionHandle, SubscriptionManager, TagId};
use opcbridge_tests::common::fixtures::TagFixtures;
use opcbridge_tests::common::mocks::MockSession;

fn manager() -> Arc<SubscriptionManager> {
    let (tx, _rx) = mpsc::unbounded_channel();
    Arc::new(SubscriptionManager::new(GroupConfig::default(), tx))
}

// =============================================================================
// Idempotent creation
// =============================================================================

#[tokio::test]
async fn test_ensure_group_concurrent_creates_exactly_one() {
    let mock = MockSession::new();
    let manager = manager();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        let mut session: SessionHandle = mock.boxed();
        handles.push(tokio::spawn(async move {
            manager.ensure_group(&mut session).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(mock.group_creations(), 1);
    assert_eq!(manager.groups_created(), 1);
}

#[tokio::test]
async fn test_ensure_group_repeated_is_a_no_op() {
    let mock = MockSession::new();
    let manager = manager();
    let mut session: SessionHandle = mock.boxed();

    for _ in 0..5 {
        manager.ensure_group(&mut session).await.unwrap();
    }

    assert_eq!(mock.group_creations(), 1);
}

// =============================================================================
// Subscribing
// =============================================================================

#[tokio::test]
async fn test_subscribe_reports_tag_count() {
    let mock = MockSession::new();
    let manager = manager();
    let mut session: SessionHandle = mock.boxed();

    let tags = TagFixtures::process_tags();
    let added = manager.subscribe_tags(&mut session, &tags).await.unwrap();

    assert_eq!(added, 3);
    assert_eq!(mock.group_creations(), 1);
    assert!(manager.has_group().await);
}

#[tokio::test]
async fn test_subscribe_twice_reuses_the_group() {
    let mock = MockSession::new();
    let manager = manager();
    let mut session: SessionHandle = mock.boxed();

    manager
        .subscribe_tags(&mut session, &[TagId::new("a")])
        .await
        .unwrap();
    manager
        .subscribe_tags(&mut session, &[TagId::new("b"), TagId::new("c")])
        .await
        .unwrap();

    assert_eq!(mock.group_creations(), 1);
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn test_teardown_detaches_removes_and_disposes() {
    let mock = MockSession::new();
    let manager = manager();
    let mut session: SessionHandle = mock.boxed();

    manager
        .subscribe_tags(&mut session, &TagFixtures::process_tags())
        .await
        .unwrap();
    manager.teardown_all().await;

    assert!(!manager.has_group().await);
    let events = mock.events();
    let detach = events.iter().position(|e| e == "group_detach").unwrap();
    let remove = events.iter().position(|e| e == "group_remove_all").unwrap();
    let dispose = events.iter().position(|e| e == "group_dispose").unwrap();
    assert!(detach < remove && remove < dispose);
}

#[tokio::test]
async fn test_teardown_continues_past_failures() {
    let mock = MockSession::new();
    mock.fail_group_remove();
    mock.fail_group_dispose();

    let manager = manager();
    let mut session: SessionHandle = mock.boxed();
    manager.ensure_group(&mut session).await.unwrap();

    // Both steps fail, teardown still finishes and clears tracking.
    manager.teardown_all().await;
    assert!(!manager.has_group().await);

    let events = mock.events();
    assert!(events.contains(&"group_remove_all".to_string()));
    assert!(events.contains(&"group_dispose".to_string()));
}

#[tokio::test]
async fn test_group_can_be_recreated_after_teardown() {
    let mock = MockSession::new();
    let manager = manager();
    let mut session: SessionHandle = mock.boxed();

    manager.ensure_group(&mut session).await.unwrap();
    manager.teardown_all().await;
    manager.ensure_group(&mut session).await.unwrap();

    assert_eq!(mock.group_creations(), 2);
    assert_eq!(manager.groups_created(), 2);
}
