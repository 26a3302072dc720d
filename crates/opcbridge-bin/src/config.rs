// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema, loading, and validation.
//!
//! The config file is TOML with three sections:
//!
//! ```toml
//! [session]
//! host = "localhost"
//! name = "opcbridge"
//!
//! [subscription]
//! group_name = "MainSubscription"
//! active = true
//! update_rate_ms = 100
//! tags = ["sim.temperature", "sim.pressure"]
//!
//! [telemetry]
//! expected_interval_ms = 100
//! latency_report_interval_ms = 1000
//! rate_window_ms = 1000
//! ```
//!
//! Every key has a default, so an empty file is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use opcbridge_core::{BridgeConfig, GroupConfig, TagId, TelemetryConfig};

// =============================================================================
// ConfigError
// =============================================================================

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but failed validation.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Schema
// =============================================================================

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FileConfig {
    /// Session connection settings.
    pub session: SessionSection,

    /// Subscription group settings.
    pub subscription: SubscriptionSection,

    /// Telemetry timing settings.
    pub telemetry: TelemetrySection,
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SessionSection {
    /// Host of the session resource.
    pub host: String,

    /// Session name to open.
    pub name: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            name: "opcbridge".to_string(),
        }
    }
}

/// `[subscription]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SubscriptionSection {
    /// Name of the single subscription group.
    pub group_name: String,

    /// Whether the group delivers notifications.
    pub active: bool,

    /// Update rate of the group in milliseconds.
    pub update_rate_ms: u64,

    /// Tags subscribed at startup.
    pub tags: Vec<String>,
}

impl Default for SubscriptionSection {
    fn default() -> Self {
        Self {
            group_name: "MainSubscription".to_string(),
            active: true,
            update_rate_ms: 100,
            tags: Vec::new(),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TelemetrySection {
    /// Expected interval between data-change batches, in milliseconds.
    pub expected_interval_ms: u64,

    /// Cadence of the periodic latency report, in milliseconds.
    pub latency_report_interval_ms: u64,

    /// Length of the arrival-rate window, in milliseconds.
    pub rate_window_ms: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            expected_interval_ms: 100,
            latency_report_interval_ms: 1_000,
            rate_window_ms: 1_000,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl FileConfig {
    /// Loads and validates a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw)?
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates field values beyond what the schema enforces.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.session.host.trim().is_empty() {
            return Err(ConfigError::Invalid("session.host must not be empty".into()));
        }
        if self.session.name.trim().is_empty() {
            return Err(ConfigError::Invalid("session.name must not be empty".into()));
        }
        if self.subscription.group_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "subscription.group_name must not be empty".into(),
            ));
        }
        if self.subscription.update_rate_ms == 0 {
            return Err(ConfigError::Invalid(
                "subscription.update_rate_ms must be greater than zero".into(),
            ));
        }
        if self.telemetry.latency_report_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.latency_report_interval_ms must be greater than zero".into(),
            ));
        }
        if self.telemetry.rate_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.rate_window_ms must be greater than zero".into(),
            ));
        }
        for tag in &self.subscription.tags {
            if tag.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "subscription.tags must not contain empty tag IDs".into(),
                ));
            }
        }
        Ok(())
    }

    /// Converts the file schema into the core bridge configuration.
    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.session.host.clone(),
            session_name: self.session.name.clone(),
            group: GroupConfig {
                name: self.subscription.group_name.clone(),
                active: self.subscription.active,
                update_rate: Duration::from_millis(self.subscription.update_rate_ms),
            },
            telemetry: TelemetryConfig {
                expected_interval: Duration::from_millis(self.telemetry.expected_interval_ms),
                latency_report_interval: Duration::from_millis(
                    self.telemetry.latency_report_interval_ms,
                ),
                rate_window: Duration::from_millis(self.telemetry.rate_window_ms),
            },
        }
    }

    /// The startup tag list as typed IDs.
    pub fn startup_tags(&self) -> Vec<TagId> {
        self.subscription.tags.iter().map(TagId::new).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
