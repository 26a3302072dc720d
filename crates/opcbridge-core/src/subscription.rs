// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription group management.
//!
//! The session resource supports subscription groups, but the bridge only
//! ever wants one. [`SubscriptionManager`] makes group creation idempotent
//! under concurrency: the first caller creates the group and attaches the
//! notification channel, everyone else finds it already there. The guard is
//! the manager's own async mutex, independent of the command actor's
//! serialization, so idempotence holds even for callers that reach the
//! session through different paths.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::session::{NotificationSender, SessionHandle, SubscriptionGroup};
use crate::types::{GroupConfig, TagId};

// =============================================================================
// SubscriptionManager
// =============================================================================

/// Tracks the subscription groups created on the session and tears them down
/// on shutdown.
pub struct SubscriptionManager {
    config: GroupConfig,
    sender: NotificationSender,
    groups: Mutex<Vec<Box<dyn SubscriptionGroup>>>,
    created: AtomicU64,
}

impl SubscriptionManager {
    /// Creates a manager. Groups it creates deliver data changes into
    /// `sender`.
    pub fn new(config: GroupConfig, sender: NotificationSender) -> Self {
        Self {
            config,
            sender,
            groups: Mutex::new(Vec::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Ensures the subscription group exists, creating it on first call.
    ///
    /// Subsequent calls are no-ops. The internal lock is held across the
    /// creation await, so two racing callers cannot both observe "no group".
    pub async fn ensure_group(&self, session: &mut SessionHandle) -> Result<(), SessionError> {
        let mut groups = self.groups.lock().await;
        self.ensure_group_locked(&mut groups, session).await
    }

    async fn ensure_group_locked(
        &self,
        groups: &mut Vec<Box<dyn SubscriptionGroup>>,
        session: &mut SessionHandle,
    ) -> Result<(), SessionError> {
        if !groups.is_empty() {
            return Ok(());
        }

        let mut group = session.create_group(self.config.clone()).await?;
        group.attach(self.sender.clone());
        self.created.fetch_add(1, Ordering::Relaxed);
        info!(
            group = group.name(),
            update_rate_ms = self.config.update_rate.as_millis() as u64,
            "subscription group created"
        );
        groups.push(group);
        Ok(())
    }

    /// Adds tags to the subscription group, creating it first if needed.
    ///
    /// Returns the number of tags actually added.
    pub async fn subscribe_tags(
        &self,
        session: &mut SessionHandle,
        tags: &[TagId],
    ) -> Result<usize, SessionError> {
        let mut groups = self.groups.lock().await;
        self.ensure_group_locked(&mut groups, session).await?;

        // ensure_group_locked guarantees at least one group here.
        let group = groups
            .last_mut()
            .ok_or_else(|| SessionError::subscription("group vanished after creation"))?;
        let added = group.add_tags(tags).await?;
        debug!(group = group.name(), added, "tags subscribed");
        Ok(added)
    }

    /// Tears down every tracked group: detach the notification handler,
    /// remove all tags, dispose the group on the resource.
    ///
    /// A failure in one step or one group is logged and teardown continues;
    /// after this call no group is tracked regardless of errors.
    pub async fn teardown_all(&self) {
        let mut groups = self.groups.lock().await;

        for mut group in groups.drain(..) {
            group.detach();

            if let Err(error) = group.remove_all().await {
                warn!(group = group.name(), %error, "failed to remove tags during teardown");
            }
            if let Err(error) = group.dispose().await {
                warn!(group = group.name(), %error, "failed to dispose group during teardown");
            }
            info!(group = group.name(), "subscription group torn down");
        }
    }

    /// Number of groups created over the manager's lifetime. Stays at 1 no
    /// matter how many callers race [`ensure_group`](Self::ensure_group).
    pub fn groups_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Returns `true` if a group currently exists.
    pub async fn has_group(&self) -> bool {
        !self.groups.lock().await.is_empty()
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("group", &self.config.name)
            .field("created", &self.groups_created())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
