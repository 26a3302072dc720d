// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session resource abstraction.
//!
//! The session resource (an industrial tag server) is opaque to the bridge:
//! this module defines the boundary it is consumed at, and nothing else. The
//! resource is single-threaded-affine: every call into a [`SessionClient`]
//! must originate from the command actor's worker, which holds the handle
//! exclusively. The one exception is data-change delivery: a subscription
//! group pushes [`NotificationBatch`]es into an mpsc channel from the
//! resource's own callback context, and those deliveries never re-enter the
//! session.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::types::{GroupConfig, NotificationBatch, TagId, TagValue, Value};

/// Sender half of the data-change notification channel.
pub type NotificationSender = mpsc::UnboundedSender<NotificationBatch>;

/// Receiver half of the data-change notification channel.
pub type NotificationReceiver = mpsc::UnboundedReceiver<NotificationBatch>;

/// An owned, boxed session client as held by the actor worker.
pub type SessionHandle = Box<dyn SessionClient>;

// =============================================================================
// SessionClient
// =============================================================================

/// The session resource consumed by the command actor.
///
/// # Threading
///
/// Implementations are driven from a single worker; `&mut self` on every
/// operation encodes that exclusivity. Implementations need `Send` (the
/// handle moves into the worker task) but not `Sync`.
///
/// # Lifecycle
///
/// 1. `connect`: performed exactly once by the worker as its first act
/// 2. `read` / `write`: batch data operations
/// 3. `create_group`: at most one subscription group per session lifetime
/// 4. `disconnect`: part of the final teardown command; a no-op when not
///    connected
#[async_trait]
pub trait SessionClient: Send {
    /// Returns the human-readable name of this session, for logging.
    fn name(&self) -> &str;

    /// Establishes a connection to the session resource.
    async fn connect(&mut self, host: &str, session_name: &str) -> Result<(), SessionError>;

    /// Closes the connection. Must be a no-op if not connected.
    async fn disconnect(&mut self) -> Result<(), SessionError>;

    /// Returns `true` if currently connected.
    fn is_connected(&self) -> bool;

    /// Reads the current values of the given tags.
    ///
    /// Tags unknown to the resource are absent from the result rather than an
    /// error; callers distinguish "not found" from operational failure.
    async fn read(&mut self, tags: &[TagId]) -> Result<Vec<TagValue>, SessionError>;

    /// Writes a value to a single tag.
    async fn write(&mut self, tag: &TagId, value: Value) -> Result<(), SessionError>;

    /// Creates a subscription group on the resource.
    ///
    /// The caller (the subscription manager) is responsible for ensuring at
    /// most one group exists; the resource itself imposes no such limit.
    async fn create_group(
        &mut self,
        config: GroupConfig,
    ) -> Result<Box<dyn SubscriptionGroup>, SessionError>;
}

// =============================================================================
// SubscriptionGroup
// =============================================================================

/// A handle to a subscription group created on the session resource.
///
/// Data changes are delivered by the group pushing batches into the channel
/// registered with [`attach`](SubscriptionGroup::attach); `detach` stops
/// delivery without destroying the group. Disposal order during teardown is
/// detach, remove all tags, dispose.
#[async_trait]
pub trait SubscriptionGroup: Send {
    /// Returns the group name.
    fn name(&self) -> &str;

    /// Registers the channel that data-change batches are delivered into.
    fn attach(&mut self, sender: NotificationSender);

    /// Detaches the data-change handler; no further batches are delivered.
    fn detach(&mut self);

    /// Adds tags to the group's watch set, returning the number added.
    async fn add_tags(&mut self, tags: &[TagId]) -> Result<usize, SessionError>;

    /// Removes all watched tags from the group.
    async fn remove_all(&mut self) -> Result<(), SessionError>;

    /// Destroys the group on the session resource.
    async fn dispose(&mut self) -> Result<(), SessionError>;
}
