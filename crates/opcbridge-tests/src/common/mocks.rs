// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Mock session client and subscription group for testing bridge components
//! in isolation.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Thread-safe for concurrent testing
//! - Easy to set up error injection
//!
//! The mock is a cheap `Clone` over shared state: tests keep one handle for
//! seeding and assertions while a boxed clone moves into the actor worker.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opcbridge_core::{
    DataQuality, GroupConfig, NotificationBatch, NotificationSender, SessionClient, SessionError,
    SubscriptionGroup, TagId, TagValue, Value,
};

// =============================================================================
// Mock Session
// =============================================================================

#[derive(Debug, Default)]
struct MockSessionState {
    values: Mutex<HashMap<TagId, Value>>,
    connected: AtomicBool,

    fail_connect: AtomicBool,
    fail_next_read: AtomicBool,
    fail_all_writes: AtomicBool,
    fail_group_dispose: AtomicBool,
    fail_group_remove: AtomicBool,

    read_delay: Mutex<Duration>,
    write_delay: Mutex<Duration>,

    connect_count: AtomicU64,
    disconnect_count: AtomicU64,
    read_count: AtomicU64,
    write_count: AtomicU64,
    group_creations: AtomicU64,

    write_history: Mutex<Vec<(TagId, Value)>>,
    // Operation order for shutdown-ordering assertions.
    events: Mutex<Vec<String>>,
    // Captured by the group's attach, usable to push batches from tests.
    notification_sender: Mutex<Option<NotificationSender>>,
}

/// A configurable mock session client.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    state: Arc<MockSessionState>,
}

impl MockSession {
    /// Creates a mock with an empty tag table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxes a clone of this mock for handing to the actor.
    pub fn boxed(&self) -> Box<dyn SessionClient> {
        Box::new(self.clone())
    }

    /// Seeds a tag value.
    pub fn set_value(&self, tag: TagId, value: Value) {
        self.state.values.lock().insert(tag, value);
    }

    /// Forces `connect` to fail.
    pub fn fail_connect(&self) {
        self.state.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Forces the next read to fail.
    pub fn fail_next_read(&self) {
        self.state.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Forces every write to fail.
    pub fn fail_all_writes(&self) {
        self.state.fail_all_writes.store(true, Ordering::SeqCst);
    }

    /// Makes the group's `dispose` fail during teardown.
    pub fn fail_group_dispose(&self) {
        self.state.fail_group_dispose.store(true, Ordering::SeqCst);
    }

    /// Makes the group's `remove_all` fail during teardown.
    pub fn fail_group_remove(&self) {
        self.state.fail_group_remove.store(true, Ordering::SeqCst);
    }

    /// Adds artificial latency to every write.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.state.write_delay.lock() = delay;
    }

    /// Adds artificial latency to every read.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.state.read_delay.lock() = delay;
    }

    /// Number of `connect` calls.
    pub fn connect_count(&self) -> u64 {
        self.state.connect_count.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_count(&self) -> u64 {
        self.state.disconnect_count.load(Ordering::SeqCst)
    }

    /// Number of `read` calls.
    pub fn read_count(&self) -> u64 {
        self.state.read_count.load(Ordering::SeqCst)
    }

    /// Number of `write` calls.
    pub fn write_count(&self) -> u64 {
        self.state.write_count.load(Ordering::SeqCst)
    }

    /// Number of subscription groups created.
    pub fn group_creations(&self) -> u64 {
        self.state.group_creations.load(Ordering::SeqCst)
    }

    /// Recorded writes, in execution order.
    pub fn write_history(&self) -> Vec<(TagId, Value)> {
        self.state.write_history.lock().clone()
    }

    /// Recorded operations, in execution order.
    pub fn events(&self) -> Vec<String> {
        self.state.events.lock().clone()
    }

    /// Delivers a data-change batch through the attached group channel.
    ///
    /// Panics if no group has been attached yet.
    pub fn push_batch(&self, batch: NotificationBatch) {
        let sender = self.state.notification_sender.lock();
        sender
            .as_ref()
            .expect("no notification channel attached")
            .send(batch)
            .expect("notification channel closed");
    }

    /// Returns `true` while a group's notification channel is attached.
    pub fn has_notification_channel(&self) -> bool {
        self.state.notification_sender.lock().is_some()
    }

    fn record_event(&self, event: impl Into<String>) {
        self.state.events.lock().push(event.into());
    }
}

#[async_trait]
impl SessionClient for MockSession {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&mut self, host: &str, _session_name: &str) -> Result<(), SessionError> {
        self.state.connect_count.fetch_add(1, Ordering::SeqCst);
        self.record_event("connect");
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(SessionError::connection_failed(format!(
                "mock refused connection to {host}"
            )));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        self.state.disconnect_count.fetch_add(1, Ordering::SeqCst);
        self.record_event("disconnect");
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn read(&mut self, tags: &[TagId]) -> Result<Vec<TagValue>, SessionError> {
        let delay = *self.state.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state.read_count.fetch_add(1, Ordering::SeqCst);
        self.record_event("read");

        if self.state.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(SessionError::read_failed(
                tags.first().map(|t| t.as_str()).unwrap_or(""),
                "injected read failure",
            ));
        }

        let values = self.state.values.lock();
        Ok(tags
            .iter()
            .filter_map(|tag| {
                values
                    .get(tag)
                    .map(|v| TagValue::new(tag.clone(), v.clone(), DataQuality::Good))
            })
            .collect())
    }

    async fn write(&mut self, tag: &TagId, value: Value) -> Result<(), SessionError> {
        let delay = *self.state.write_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state.write_count.fetch_add(1, Ordering::SeqCst);
        self.record_event(format!("write:{tag}"));

        if self.state.fail_all_writes.load(Ordering::SeqCst) {
            return Err(SessionError::write_failed(
                tag.as_str(),
                "injected write failure",
            ));
        }

        self.state
            .values
            .lock()
            .insert(tag.clone(), value.clone());
        self.state.write_history.lock().push((tag.clone(), value));
        Ok(())
    }

    async fn create_group(
        &mut self,
        config: GroupConfig,
    ) -> Result<Box<dyn SubscriptionGroup>, SessionError> {
        self.state.group_creations.fetch_add(1, Ordering::SeqCst);
        self.record_event("create_group");
        Ok(Box::new(MockGroup {
            name: config.name,
            session: self.clone(),
            tags: Vec::new(),
        }))
    }
}

// =============================================================================
// Mock Group
// =============================================================================

/// Subscription group handle produced by [`MockSession::create_group`].
pub struct MockGroup {
    name: String,
    session: MockSession,
    tags: Vec<TagId>,
}

#[async_trait]
impl SubscriptionGroup for MockGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self, sender: NotificationSender) {
        *self.session.state.notification_sender.lock() = Some(sender);
    }

    fn detach(&mut self) {
        self.session.record_event("group_detach");
        self.session.state.notification_sender.lock().take();
    }

    async fn add_tags(&mut self, tags: &[TagId]) -> Result<usize, SessionError> {
        self.tags.extend_from_slice(tags);
        Ok(tags.len())
    }

    async fn remove_all(&mut self) -> Result<(), SessionError> {
        self.session.record_event("group_remove_all");
        if self.session.state.fail_group_remove.load(Ordering::SeqCst) {
            return Err(SessionError::subscription("injected remove failure"));
        }
        self.tags.clear();
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), SessionError> {
        self.session.record_event("group_dispose");
        if self.session.state.fail_group_dispose.load(Ordering::SeqCst) {
            return Err(SessionError::subscription("injected dispose failure"));
        }
        Ok(())
    }
}
