// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bridge runtime orchestration.
//!
//! Wires the pieces together in order: load config, start the bridge over a
//! session client, subscribe the startup tags, then hold until a shutdown
//! signal (or the optional run duration) and take the bridge down gracefully.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use opcbridge_core::Bridge;
use opcbridge_sim::SimulatorSession;

use crate::config::FileConfig;
use crate::error::BinResult;
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// BridgeRuntime
// =============================================================================

/// The running bridge process: one bridge, one shutdown coordinator.
pub struct BridgeRuntime {
    config: FileConfig,
    shutdown: ShutdownCoordinator,
    run_for: Option<Duration>,
    skip_subscribe: bool,
}

impl BridgeRuntime {
    /// Creates a runtime from an already-loaded configuration.
    pub fn new(config: FileConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownCoordinator::new(),
            run_for: None,
            skip_subscribe: false,
        }
    }

    /// The shutdown coordinator, for external triggering.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the bridge until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting opcbridge v{}", opcbridge_core::VERSION);

        let session = Box::new(SimulatorSession::new());
        let bridge = Bridge::start(session, self.config.to_bridge_config());

        let startup_tags = self.config.startup_tags();
        if self.skip_subscribe || startup_tags.is_empty() {
            info!("no startup tags to subscribe");
        } else {
            match bridge.subscribe_tags(startup_tags.clone()).await {
                Ok(count) => info!(count, "startup tags subscribed"),
                Err(error) => warn!(%error, "startup subscription failed"),
            }

            for tag in &startup_tags {
                match bridge.read_tag(tag.clone()).await {
                    Ok(Some(value)) => info!(
                        tag = %value.tag_id,
                        value = %value.value,
                        quality = ?value.quality,
                        "initial read"
                    ),
                    Ok(None) => warn!(tag = %tag, "tag not known to the session"),
                    Err(error) => warn!(tag = %tag, %error, "initial read failed"),
                }
            }
        }

        info!("opcbridge is ready");
        match self.run_for {
            Some(duration) => {
                tokio::select! {
                    _ = self.shutdown.wait_for_shutdown() => {}
                    _ = tokio::time::sleep(duration) => {
                        info!(seconds = duration.as_secs(), "run duration elapsed");
                    }
                }
            }
            None => self.shutdown.wait_for_shutdown().await,
        }

        info!("Shutdown initiated, cleaning up...");
        bridge.shutdown().await;
        info!("opcbridge shutdown complete");
        Ok(())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the bridge runtime.
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    run_for: Option<Duration>,
    skip_subscribe: bool,
}

impl RuntimeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Stops the bridge automatically after the given duration.
    pub fn run_for(mut self, duration: Option<Duration>) -> Self {
        self.run_for = duration;
        self
    }

    /// Skips subscribing the configured startup tags.
    pub fn skip_subscribe(mut self, skip: bool) -> Self {
        self.skip_subscribe = skip;
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> BinResult<BridgeRuntime> {
        let config = match &self.config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut runtime = BridgeRuntime::new(config);
        runtime.run_for = self.run_for;
        runtime.skip_subscribe = self.skip_subscribe;
        Ok(runtime)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runtime_full_cycle_with_duration() {
        let mut config = FileConfig::default();
        config.subscription.tags = vec!["sim.temperature".to_string()];
        config.subscription.update_rate_ms = 10;

        let mut runtime = BridgeRuntime::new(config);
        runtime.run_for = Some(Duration::from_millis(100));

        tokio::time::timeout(Duration::from_secs(5), runtime.run())
            .await
            .expect("runtime stopped on its own")
            .unwrap();
    }

    #[tokio::test]
    async fn test_runtime_stops_on_shutdown_signal() {
        let runtime = RuntimeBuilder::new().skip_subscribe(true).build().unwrap();
        let coordinator = runtime.shutdown_coordinator();

        let handle = tokio::spawn(runtime.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        coordinator.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runtime stopped")
            .unwrap()
            .unwrap();
    }
}
