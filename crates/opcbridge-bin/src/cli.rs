// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Subcommands:
//!
//! - `run`: Start the bridge (default)
//! - `validate`: Validate configuration file
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// opcbridge - serialized-session gateway for industrial tag servers
///
/// Bridges concurrent callers to a single-threaded-affine tag session through
/// a serializing command actor, with subscription-driven data-change
/// telemetry.
#[derive(Parser, Debug)]
#[command(
    name = "opcbridge",
    author = "Sylvex <contact@sylvex.io>",
    version = opcbridge_core::VERSION,
    about = "Serialized-session gateway for industrial tag servers",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "opcbridge.toml",
        env = "OPCBRIDGE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "OPCBRIDGE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "OPCBRIDGE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the opcbridge CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the bridge
    ///
    /// This is the default command when no subcommand is specified. It starts
    /// the bridge against the simulated session, subscribes the configured
    /// tags, and runs until a shutdown signal arrives.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without starting the
    /// bridge.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Stop automatically after this many seconds (run until signaled when
    /// omitted)
    #[arg(long)]
    pub run_for: Option<u64>,

    /// Skip subscribing the configured startup tags
    #[arg(long)]
    pub skip_subscribe: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["opcbridge"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_for_flag() {
        let cli = Cli::parse_from(["opcbridge", "run", "--run-for", "5"]);
        if let Some(Commands::Run(args)) = cli.command {
            assert_eq!(args.run_for, Some(5));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["opcbridge", "validate", "--show-config"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["opcbridge", "-c", "/etc/opcbridge/bridge.toml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/opcbridge/bridge.toml"));
    }

    #[test]
    fn test_quiet_and_verbose_levels() {
        let cli = Cli::parse_from(["opcbridge", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["opcbridge", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");

        let cli = Cli::parse_from(["opcbridge", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(), "trace");
    }
}
