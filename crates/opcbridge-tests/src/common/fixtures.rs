// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test fixtures: pre-built tags, batches, and configs.

use std::time::Duration;

use chrono::Utc;

use opcbridge_core::{
    BridgeConfig, DataQuality, GroupConfig, NotificationBatch, TagId, TagValue, TelemetryConfig,
    Value,
};

/// Tag fixtures.
pub struct TagFixtures;

impl TagFixtures {
    /// A small set of process tags.
    pub fn process_tags() -> Vec<TagId> {
        vec![
            TagId::new("plant.line1.temperature"),
            TagId::new("plant.line1.pressure"),
            TagId::new("plant.line1.flow"),
        ]
    }
}

/// Notification batch fixtures.
pub struct BatchFixtures;

impl BatchFixtures {
    /// A batch whose values carry the given latencies relative to now.
    pub fn with_latencies_ms(sequence: u64, latencies_ms: &[i64]) -> NotificationBatch {
        let values = latencies_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                TagValue::with_timestamp(
                    TagId::new(format!("tag-{i}")),
                    Value::Float64(i as f64),
                    DataQuality::Good,
                    Utc::now() - chrono::Duration::milliseconds(*ms),
                )
            })
            .collect();
        NotificationBatch { sequence, values }
    }

    /// A batch of `count` values stamped now.
    pub fn of_size(sequence: u64, count: usize) -> NotificationBatch {
        Self::with_latencies_ms(sequence, &vec![0; count])
    }
}

/// Configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// A bridge config with fast timings suited to tests.
    pub fn fast_bridge() -> BridgeConfig {
        BridgeConfig {
            host: "localhost".to_string(),
            session_name: "test-session".to_string(),
            group: GroupConfig {
                name: "TestGroup".to_string(),
                ..GroupConfig::default()
            },
            telemetry: TelemetryConfig {
                latency_report_interval: Duration::from_millis(50),
                rate_window: Duration::from_millis(100),
                ..TelemetryConfig::default()
            },
        }
        .with_update_rate(Duration::from_millis(10))
    }
}
