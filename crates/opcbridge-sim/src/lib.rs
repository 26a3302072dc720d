// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcbridge-sim
//!
//! An in-memory session client standing in for a real industrial tag server.
//! Tags live in a shared table; the subscription group runs a periodic
//! emitter that perturbs watched numeric tags and delivers them as
//! data-change batches, so the full bridge loop (reads, writes,
//! notifications, telemetry) runs without any external server.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use opcbridge_core::{
    DataQuality, GroupConfig, NotificationBatch, NotificationSender, SessionClient, SessionError,
    SubscriptionGroup, TagId, TagValue, Value,
};

type TagTable = Arc<Mutex<HashMap<TagId, Value>>>;

// =============================================================================
// SimulatorSession
// =============================================================================

/// A simulated tag session backed by an in-memory table.
pub struct SimulatorSession {
    name: String,
    connected: bool,
    fail_connect: bool,
    tags: TagTable,
}

impl SimulatorSession {
    /// Creates a session seeded with a handful of process-like tags.
    pub fn new() -> Self {
        let mut tags = HashMap::new();
        tags.insert(TagId::new("sim.temperature"), Value::Float64(21.5));
        tags.insert(TagId::new("sim.pressure"), Value::Float64(101.3));
        tags.insert(TagId::new("sim.flow_rate"), Value::Float64(12.0));
        tags.insert(TagId::new("sim.motor_speed"), Value::Float64(1480.0));
        tags.insert(TagId::new("sim.running"), Value::Bool(true));

        Self {
            name: "simulator".to_string(),
            connected: false,
            fail_connect: false,
            tags: Arc::new(Mutex::new(tags)),
        }
    }

    /// Replaces the seeded tag table.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (TagId, Value)>) -> Self {
        self.tags = Arc::new(Mutex::new(tags.into_iter().collect()));
        self
    }

    /// Makes `connect` fail, for exercising the degraded path.
    pub fn with_failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Shared handle to the tag table, for seeding and assertions.
    pub fn tag_table(&self) -> TagTable {
        self.tags.clone()
    }
}

impl Default for SimulatorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionClient for SimulatorSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self, host: &str, session_name: &str) -> Result<(), SessionError> {
        if self.fail_connect {
            return Err(SessionError::connection_failed(format!(
                "simulated refusal from {host}"
            )));
        }
        self.connected = true;
        info!(host, session = session_name, "simulator session opened");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        if self.connected {
            self.connected = false;
            info!("simulator session closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read(&mut self, tags: &[TagId]) -> Result<Vec<TagValue>, SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        let table = self.tags.lock();
        Ok(tags
            .iter()
            .filter_map(|tag| {
                table
                    .get(tag)
                    .map(|value| TagValue::new(tag.clone(), value.clone(), DataQuality::Good))
            })
            .collect())
    }

    async fn write(&mut self, tag: &TagId, value: Value) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.tags.lock().insert(tag.clone(), value);
        Ok(())
    }

    async fn create_group(
        &mut self,
        config: GroupConfig,
    ) -> Result<Box<dyn SubscriptionGroup>, SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        Ok(Box::new(SimulatorGroup::new(config, self.tags.clone())))
    }
}

// =============================================================================
// SimulatorGroup
// =============================================================================

/// A subscription group that emits periodic change batches for its watched
/// tags.
pub struct SimulatorGroup {
    config: GroupConfig,
    table: TagTable,
    watched: Arc<Mutex<HashSet<TagId>>>,
    sequence: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
    emitter: Option<JoinHandle<()>>,
}

impl SimulatorGroup {
    fn new(config: GroupConfig, table: TagTable) -> Self {
        Self {
            config,
            table,
            watched: Arc::new(Mutex::new(HashSet::new())),
            sequence: Arc::new(AtomicU64::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
            emitter: None,
        }
    }

    fn stop_emitter(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.emitter.take() {
            handle.abort();
        }
    }

    async fn emit_loop(
        sender: NotificationSender,
        table: TagTable,
        watched: Arc<Mutex<HashSet<TagId>>>,
        sequence: Arc<AtomicU64>,
        stopped: Arc<AtomicBool>,
        update_rate: std::time::Duration,
    ) {
        let mut ticker = tokio::time::interval(update_rate);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if stopped.load(Ordering::SeqCst) {
                break;
            }

            let values: Vec<TagValue> = {
                let mut table = table.lock();
                let watched = watched.lock();
                let mut rng = rand::thread_rng();
                watched
                    .iter()
                    .filter_map(|tag| {
                        let value = table.get_mut(tag)?;
                        if let Value::Float64(v) = value {
                            *v += rng.gen_range(-0.5..0.5);
                        }
                        Some(TagValue::new(
                            tag.clone(),
                            value.clone(),
                            DataQuality::Good,
                        ))
                    })
                    .collect()
            };

            if values.is_empty() {
                continue;
            }

            let batch = NotificationBatch {
                sequence: sequence.fetch_add(1, Ordering::Relaxed),
                values,
            };
            if sender.send(batch).is_err() {
                break;
            }
        }
    }
}

#[async_trait]
impl SubscriptionGroup for SimulatorGroup {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn attach(&mut self, sender: NotificationSender) {
        self.stop_emitter();
        if !self.config.active {
            return;
        }
        self.stopped.store(false, Ordering::SeqCst);
        self.emitter = Some(tokio::spawn(Self::emit_loop(
            sender,
            self.table.clone(),
            self.watched.clone(),
            self.sequence.clone(),
            self.stopped.clone(),
            self.config.update_rate,
        )));
        debug!(
            group = %self.config.name,
            update_rate_ms = self.config.update_rate.as_millis() as u64,
            "simulator emitter started"
        );
    }

    fn detach(&mut self) {
        self.stop_emitter();
    }

    async fn add_tags(&mut self, tags: &[TagId]) -> Result<usize, SessionError> {
        let mut watched = self.watched.lock();
        let before = watched.len();
        watched.extend(tags.iter().cloned());
        Ok(watched.len() - before)
    }

    async fn remove_all(&mut self) -> Result<(), SessionError> {
        self.watched.lock().clear();
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), SessionError> {
        self.stop_emitter();
        self.watched.lock().clear();
        Ok(())
    }
}

impl Drop for SimulatorGroup {
    fn drop(&mut self) {
        self.stop_emitter();
    }
}

// =============================================================================
// Tests
// =============================================================================
