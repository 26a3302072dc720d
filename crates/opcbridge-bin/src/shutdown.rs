// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown coordination.
//!
//! Handles OS signals (SIGTERM, SIGINT, SIGQUIT on Unix; Ctrl+C on Windows)
//! and fans the shutdown decision out to interested components over a
//! broadcast channel. The bridge itself is shut down by the runtime after
//! this coordinator fires, so no in-flight command is abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Coordinates graceful shutdown across the runtime's components.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribes to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Initiates shutdown, notifying all subscribers. Idempotent.
    pub fn initiate_shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Shutdown initiated");
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Waits for a shutdown signal: an OS signal, or a prior manual
    /// initiation.
    pub async fn wait_for_shutdown(&self) {
        if self.initiated.load(Ordering::SeqCst) {
            return;
        }

        let mut manual = self.sender.subscribe();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
            let mut sigquit =
                signal(SignalKind::quit()).expect("Failed to register SIGQUIT handler");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
                _ = sigquit.recv() => info!("Received SIGQUIT"),
                _ = manual.recv() => {}
            }
        }

        #[cfg(windows)]
        {
            use tokio::signal::ctrl_c;

            tokio::select! {
                result = ctrl_c() => {
                    result.expect("Failed to register Ctrl+C handler");
                    info!("Received Ctrl+C");
                }
                _ = manual.recv() => {}
            }
        }

        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.sender.send(());
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_initiation_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();

        assert!(!coordinator.is_shutdown_initiated());
        coordinator.initiate_shutdown();
        coordinator.initiate_shutdown();

        assert!(coordinator.is_shutdown_initiated());
        rx.recv().await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_after_initiation() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.initiate_shutdown();
        // Must not hang.
        coordinator.wait_for_shutdown().await;
    }

    #[tokio::test]
    async fn test_wait_unblocks_on_manual_initiation() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();

        let handle = tokio::spawn(async move { waiter.wait_for_shutdown().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        coordinator.initiate_shutdown();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("waiter unblocked")
            .unwrap();
    }
}
