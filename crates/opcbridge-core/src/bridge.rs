// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The bridge facade and its lifecycle.
//!
//! [`Bridge`] is the public surface a request front end consumes: tag reads,
//! writes, and subscription changes, all routed through the command actor and
//! synchronous from the caller's perspective. Construction wires the whole
//! pipeline together with explicit dependency injection; there is no global
//! instance.
//!
//! Shutdown is ordered: raise the fail-fast flag, run a final teardown
//! command behind everything already queued, wait for it, close the queue,
//! join the worker, stop telemetry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::actor::{CommandActor, ConnectInfo};
use crate::error::BridgeResult;
use crate::session::SessionHandle;
use crate::subscription::SubscriptionManager;
use crate::telemetry::{TelemetryConfig, TelemetryPipeline};
use crate::types::{GroupConfig, NotificationBatch, TagId, TagValue, Value};

// =============================================================================
// BridgeConfig
// =============================================================================

/// Everything the bridge needs to run one session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Host of the session resource.
    pub host: String,

    /// Session name to open on the resource.
    pub session_name: String,

    /// Subscription group settings.
    pub group: GroupConfig,

    /// Telemetry timing settings.
    pub telemetry: TelemetryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            session_name: "opcbridge".to_string(),
            group: GroupConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Keeps the jitter baseline in step with the group's update rate.
    pub fn with_update_rate(mut self, rate: Duration) -> Self {
        self.group.update_rate = rate;
        self.telemetry.expected_interval = rate;
        self
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// The running bridge: one session, one worker, one subscription group, one
/// telemetry pipeline.
pub struct Bridge {
    actor: CommandActor,
    subscriptions: Arc<SubscriptionManager>,
    telemetry: TelemetryPipeline,
}

impl Bridge {
    /// Starts the bridge over the given session.
    ///
    /// Spawns the actor worker (whose first act is the connect), the
    /// telemetry pump, and the periodic latency reporter. Returns
    /// immediately; a connect failure is logged by the worker and surfaces
    /// later as per-operation errors.
    pub fn start(session: SessionHandle, config: BridgeConfig) -> Self {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let telemetry = TelemetryPipeline::spawn(config.telemetry.clone(), notify_rx);
        let subscriptions = Arc::new(SubscriptionManager::new(config.group.clone(), notify_tx));
        let actor = CommandActor::spawn(
            session,
            ConnectInfo {
                host: config.host.clone(),
                session_name: config.session_name.clone(),
            },
        );

        info!(
            host = %config.host,
            session = %config.session_name,
            "bridge started"
        );

        Self {
            actor,
            subscriptions,
            telemetry,
        }
    }

    /// Reads the current value of one tag.
    ///
    /// `Ok(None)` means the resource does not know the tag; transport
    /// failures come back as errors.
    pub async fn read_tag(&self, tag: TagId) -> BridgeResult<Option<TagValue>> {
        self.actor
            .submit_and_wait("read_tag", move |mut session| async move {
                let result = session.read(std::slice::from_ref(&tag)).await.map(|values| {
                    values.into_iter().find(|value| value.tag_id == tag)
                });
                (session, result)
            })
            .await
    }

    /// Writes a value to one tag. Returns once the worker has executed the
    /// write; underlying failure propagates to this caller only.
    pub async fn write_tag(&self, tag: TagId, value: Value) -> BridgeResult<()> {
        self.actor
            .submit_and_wait("write_tag", move |mut session| async move {
                let result = session.write(&tag, value).await;
                (session, result)
            })
            .await
    }

    /// Subscribes the given tags, creating the group on first use. Returns
    /// the number of tags subscribed.
    pub async fn subscribe_tags(&self, tags: Vec<TagId>) -> BridgeResult<usize> {
        let subscriptions = self.subscriptions.clone();
        self.actor
            .submit_and_wait("subscribe_tags", move |mut session| async move {
                let result = subscriptions.subscribe_tags(&mut session, &tags).await;
                (session, result)
            })
            .await
    }

    /// Subscribes an observer to the data-change re-broadcast.
    pub fn observe_changes(&self) -> broadcast::Receiver<NotificationBatch> {
        self.telemetry.observe()
    }

    /// The subscription manager, exposed for inspection.
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// The telemetry pipeline, exposed for inspection.
    pub fn telemetry(&self) -> &TelemetryPipeline {
        &self.telemetry
    }

    /// Number of commands the worker has executed.
    pub fn commands_executed(&self) -> u64 {
        self.actor.commands_executed()
    }

    /// Shuts the bridge down in order.
    ///
    /// New submissions fail fast from the moment this is called; everything
    /// already queued still runs, then the teardown command detaches and
    /// disposes the subscription group and disconnects the session. Only
    /// after the worker has joined are the telemetry tasks stopped.
    pub async fn shutdown(&self) {
        info!("bridge shutting down");
        self.actor.begin_shutdown();

        let subscriptions = self.subscriptions.clone();
        let teardown = self
            .actor
            .submit_and_wait_unchecked("teardown", move |mut session| async move {
                subscriptions.teardown_all().await;
                if let Err(error) = session.disconnect().await {
                    warn!(%error, "disconnect failed during teardown");
                }
                (session, Ok(()))
            })
            .await;
        if let Err(error) = teardown {
            warn!(%error, "teardown command did not run");
        }

        self.actor.close();
        self.actor.join().await;
        self.telemetry.stop().await;

        info!(
            commands = self.actor.commands_executed(),
            "bridge stopped"
        );
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("actor", &self.actor)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
