// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcbridge-bin
//!
//! CLI binary for the opcbridge gateway:
//!
//! - CLI argument parsing with clap
//! - Configuration loading and validation
//! - Bridge runtime orchestration
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the bridge (default command)
//! opcbridge
//!
//! # Start with custom config
//! opcbridge -c /etc/opcbridge/bridge.toml
//!
//! # Run for ten seconds and stop
//! opcbridge run --run-for 10
//!
//! # Validate configuration
//! opcbridge validate
//!
//! # Show version
//! opcbridge version
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use config::{ConfigError, FileConfig};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{BridgeRuntime, RuntimeBuilder};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
