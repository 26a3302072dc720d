// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The serialized command actor.
//!
//! Concurrent callers funnel all session-resource access through a single
//! worker task that owns the [`SessionHandle`] exclusively. Commands are
//! executed strictly in submission order; each command threads ownership of
//! the handle through its future and returns it to the worker, so no other
//! context can ever touch the session.
//!
//! # Failure isolation
//!
//! A command's failure is captured in its own completion channel and logged;
//! it never propagates to the worker loop or to sibling commands. The loop is
//! unkillable by construction: it does nothing with a command's outcome
//! except count it.
//!
//! # Shutdown
//!
//! [`begin_shutdown`](CommandActor::begin_shutdown) makes subsequent public
//! submissions fail fast, while commands already queued continue to drain in
//! FIFO order. The final teardown command is submitted through the unchecked
//! path, so it runs after everything queued before shutdown began.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use crate::error::{ActorError, BridgeError, SessionError};
use crate::session::SessionHandle;

// =============================================================================
// Command
// =============================================================================

type CommandFuture = Pin<Box<dyn Future<Output = SessionHandle> + Send>>;
type CommandFn = Box<dyn FnOnce(SessionHandle) -> CommandFuture + Send>;

/// A unit of work submitted to the actor.
///
/// The action takes ownership of the session handle and must return it; any
/// completion signalling or failure capture is the action's own business
/// (see [`CommandActor::submit_and_wait`] for the standard wrapping).
pub struct Command {
    id: Uuid,
    label: &'static str,
    submitted_at: Instant,
    run: CommandFn,
}

impl Command {
    /// Creates a new command from an async action.
    pub fn new<F, Fut>(label: &'static str, action: F) -> Self
    where
        F: FnOnce(SessionHandle) -> Fut + Send + 'static,
        Fut: Future<Output = SessionHandle> + Send + 'static,
    {
        Self {
            id: Uuid::now_v7(),
            label,
            submitted_at: Instant::now(),
            run: Box::new(move |session| Box::pin(action(session))),
        }
    }

    /// Returns the unique command ID.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the command label used in logs.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConnectInfo
// =============================================================================

/// Connection parameters applied by the worker as its first act.
#[derive(Debug, Clone)]
pub struct ConnectInfo {
    /// Host the session resource lives on.
    pub host: String,

    /// Name of the session to open.
    pub session_name: String,
}

// =============================================================================
// CommandActor
// =============================================================================

/// Accepts commands from any caller context and executes them one at a time
/// on a dedicated worker task.
pub struct CommandActor {
    sender: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    shutting_down: Arc<AtomicBool>,
    executed: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CommandActor {
    /// Spawns the worker task, handing it exclusive ownership of the session.
    ///
    /// The worker connects exactly once before serving commands. A connect
    /// failure is logged and non-fatal: the session stays disconnected and
    /// subsequent commands fail individually against it.
    pub fn spawn(session: SessionHandle, connect: ConnectInfo) -> Self {
        // Unbounded by design: command volume is caller-request-driven.
        let (tx, rx) = mpsc::unbounded_channel();
        let executed = Arc::new(AtomicU64::new(0));

        let worker = tokio::spawn(Self::worker_loop(session, connect, rx, executed.clone()));

        Self {
            sender: Mutex::new(Some(tx)),
            shutting_down: Arc::new(AtomicBool::new(false)),
            executed,
            worker: Mutex::new(Some(worker)),
        }
    }

    async fn worker_loop(
        mut session: SessionHandle,
        connect: ConnectInfo,
        mut rx: mpsc::UnboundedReceiver<Command>,
        executed: Arc<AtomicU64>,
    ) {
        match session.connect(&connect.host, &connect.session_name).await {
            Ok(()) => info!(
                host = %connect.host,
                session = %connect.session_name,
                "session connected"
            ),
            Err(error) => error!(
                host = %connect.host,
                session = %connect.session_name,
                %error,
                "session connect failed"
            ),
        }

        while let Some(command) = rx.recv().await {
            trace!(
                id = %command.id,
                command = command.label,
                queued_us = command.submitted_at.elapsed().as_micros() as u64,
                "executing command"
            );
            session = (command.run)(session).await;
            executed.fetch_add(1, Ordering::Relaxed);
        }

        debug!("command queue closed, worker exiting");
    }

    /// Enqueues a command; returns immediately.
    ///
    /// Fails with [`ActorError::ShuttingDown`] once shutdown has begun and
    /// [`ActorError::Closed`] once the queue is closed, so callers never
    /// block on a worker that will not run their command.
    pub fn submit(&self, command: Command) -> Result<(), ActorError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(ActorError::ShuttingDown);
        }
        self.submit_unchecked(command)
    }

    /// Enqueues a command regardless of the shutdown flag.
    ///
    /// Reserved for the final teardown command, which must run after the
    /// fail-fast flag is already raised.
    pub(crate) fn submit_unchecked(&self, command: Command) -> Result<(), ActorError> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => tx.send(command).map_err(|_| ActorError::Closed),
            None => Err(ActorError::Closed),
        }
    }

    /// Submits an action and waits for the worker to execute it.
    ///
    /// Returns the action's result, or re-raises the `SessionError` it
    /// captured during execution. The call never returns before the command
    /// has run; it blocks only its own caller, never the worker.
    pub async fn submit_and_wait<T, F, Fut>(
        &self,
        label: &'static str,
        action: F,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(SessionHandle) -> Fut + Send + 'static,
        Fut: Future<Output = (SessionHandle, Result<T, SessionError>)> + Send + 'static,
    {
        self.submit_and_wait_inner(label, action, false).await
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait), but bypasses the
    /// shutdown fail-fast flag. Used for the final teardown command.
    pub(crate) async fn submit_and_wait_unchecked<T, F, Fut>(
        &self,
        label: &'static str,
        action: F,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(SessionHandle) -> Fut + Send + 'static,
        Fut: Future<Output = (SessionHandle, Result<T, SessionError>)> + Send + 'static,
    {
        self.submit_and_wait_inner(label, action, true).await
    }

    async fn submit_and_wait_inner<T, F, Fut>(
        &self,
        label: &'static str,
        action: F,
        bypass_shutdown: bool,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(SessionHandle) -> Fut + Send + 'static,
        Fut: Future<Output = (SessionHandle, Result<T, SessionError>)> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = Command::new(label, move |session| async move {
            let (session, result) = action(session).await;
            if let Err(ref error) = result {
                error!(command = label, %error, "command failed");
            }
            // The waiter may have gone away; the command still counts as run.
            let _ = reply_tx.send(result);
            session
        });

        if bypass_shutdown {
            self.submit_unchecked(command)?;
        } else {
            self.submit(command)?;
        }

        let result = reply_rx.await.map_err(|_| ActorError::WorkerGone)?;
        Ok(result?)
    }

    /// Marks the actor as shutting down; subsequent public submissions fail
    /// fast. Queued commands are unaffected.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Closes the command queue. The worker exits after draining it.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    /// Waits for the worker task to exit.
    ///
    /// Call after [`close`](Self::close); joining an open queue waits
    /// forever.
    pub async fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                error!(%error, "worker task join failed");
            }
        }
    }

    /// Returns the number of commands the worker has executed.
    pub fn commands_executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for CommandActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandActor")
            .field("shutting_down", &self.is_shutting_down())
            .field("executed", &self.commands_executed())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionClient, SubscriptionGroup};
    use crate::types::{GroupConfig, TagId, TagValue, Value};
    use async_trait::async_trait;
    use std::time::Duration;

    /// A do-nothing session for exercising the actor alone.
    struct NullSession {
        connected: bool,
    }

    impl NullSession {
        fn new() -> Self {
            Self { connected: false }
        }
    }

    #[async_trait]
    impl SessionClient for NullSession {
        fn name(&self) -> &str {
            "null"
        }

        async fn connect(&mut self, _host: &str, _session_name: &str) -> Result<(), SessionError> {
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), SessionError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn read(&mut self, _tags: &[TagId]) -> Result<Vec<TagValue>, SessionError> {
            Ok(Vec::new())
        }

        async fn write(&mut self, _tag: &TagId, _value: Value) -> Result<(), SessionError> {
            Ok(())
        }

        async fn create_group(
            &mut self,
            _config: GroupConfig,
        ) -> Result<Box<dyn SubscriptionGroup>, SessionError> {
            Err(SessionError::subscription("not supported"))
        }
    }

    fn test_actor() -> CommandActor {
        CommandActor::spawn(
            Box::new(NullSession::new()),
            ConnectInfo {
                host: "localhost".into(),
                session_name: "test".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_submit_and_wait_returns_result() {
        let actor = test_actor();

        let value = actor
            .submit_and_wait("probe", |session| async move { (session, Ok(41 + 1)) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        actor.close();
        actor.join().await;
    }

    #[tokio::test]
    async fn test_failure_reaches_only_its_waiter() {
        let actor = test_actor();

        let ok = actor
            .submit_and_wait("ok", |session| async move { (session, Ok(1u32)) })
            .await;
        let failed: Result<u32, _> = actor
            .submit_and_wait("bad", |session| async move {
                (session, Err(SessionError::read_failed("t", "boom")))
            })
            .await;
        let ok_after = actor
            .submit_and_wait("ok", |session| async move { (session, Ok(2u32)) })
            .await;

        assert_eq!(ok.unwrap(), 1);
        assert!(matches!(
            failed,
            Err(BridgeError::Session(SessionError::ReadFailed { .. }))
        ));
        assert_eq!(ok_after.unwrap(), 2);
        assert_eq!(actor.commands_executed(), 3);

        actor.close();
        actor.join().await;
    }

    #[tokio::test]
    async fn test_submit_fails_fast_after_shutdown_begins() {
        let actor = test_actor();
        actor.begin_shutdown();

        let result = actor.submit(Command::new("late", |session| async move { session }));
        assert_eq!(result, Err(ActorError::ShuttingDown));

        // The unchecked path still works for teardown.
        let teardown = actor
            .submit_and_wait_unchecked("teardown", |session| async move { (session, Ok(())) })
            .await;
        assert!(teardown.is_ok());

        actor.close();
        actor.join().await;
    }

    #[tokio::test]
    async fn test_submit_after_close_is_rejected() {
        let actor = test_actor();
        actor.close();
        actor.join().await;

        let result = actor.submit(Command::new("late", |session| async move { session }));
        assert_eq!(result, Err(ActorError::Closed));
    }

    #[tokio::test]
    async fn test_queued_commands_drain_before_worker_exits() {
        let actor = test_actor();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5u32 {
            let log = log.clone();
            actor
                .submit(Command::new("seq", move |session| async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    log.lock().push(i);
                    session
                }))
                .unwrap();
        }

        actor.close();
        actor.join().await;

        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(actor.commands_executed(), 5);
    }
}
