// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the opcbridge binary.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for opcbridge-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the opcbridge binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Config loading or validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Core bridge error.
    #[error("Bridge error: {0}")]
    Bridge(#[from] opcbridge_core::BridgeError),
}

impl BinError {
    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Initialization(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Bridge(_) => 5,
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            BinError::Config(ConfigError::Invalid("x".into())).exit_code(),
            1
        );
        assert_eq!(BinError::init("test").exit_code(), 2);
        assert_eq!(BinError::runtime("test").exit_code(), 3);
        assert_eq!(BinError::Io("test".into()).exit_code(), 4);
    }

    #[test]
    fn test_config_error_display() {
        let err = BinError::Config(ConfigError::Invalid("session.host must not be empty".into()));
        assert!(err.to_string().contains("session.host"));
    }
}
