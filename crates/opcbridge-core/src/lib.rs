// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcbridge-core
//!
//! Core of the opcbridge gateway: a serialized command actor bridging
//! concurrent callers to a single-threaded-affine industrial tag session,
//! plus the subscription manager and data-change telemetry pipeline built on
//! top of it.
//!
//! ## Architecture
//!
//! ```text
//! callers ──submit──▶ CommandActor ──▶ worker task ──▶ SessionClient
//!                                                        │
//!                                 data-change batches ◀──┘
//!                                         │
//!                                         ▼
//!                                 TelemetryPipeline ──▶ rate / latency /
//!                                         │             jitter reports
//!                                         ▼
//!                                 broadcast observers
//! ```
//!
//! All session access is serialized on the worker; data-change delivery is
//! the one concurrent path and touches only telemetry state.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod actor;
pub mod bridge;
pub mod error;
pub mod session;
pub mod subscription;
pub mod telemetry;
pub mod types;

pub use actor::{Command, CommandActor, ConnectInfo};
pub use bridge::{Bridge, BridgeConfig};
pub use error::{ActorError, BridgeError, BridgeResult, SessionError, SessionResult};
pub use session::{
    NotificationReceiver, NotificationSender, SessionClient, SessionHandle, SubscriptionGroup,
};
pub use subscription::SubscriptionManager;
pub use telemetry::{
    JitterSample, JitterTracker, LatencyAccumulator, LatencySummary, RateSample, RateWindow,
    TelemetryConfig, TelemetryPipeline,
};
pub use types::{
    BadReason, DataQuality, GroupConfig, NotificationBatch, TagId, TagValue, UncertainReason,
    Value,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
