// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for opcbridge.
//!
//! # Error Hierarchy
//!
//! ```text
//! BridgeError (root)
//! ├── SessionError   - Session resource operations (connect/read/write/subscribe)
//! └── ActorError     - Command actor queue and worker lifecycle
//! ```
//!
//! A failed command carries its `SessionError` back to the exact caller that
//! submitted it; failures never cross from one command to another.

use thiserror::Error;

// =============================================================================
// BridgeError - Root Error Type
// =============================================================================

/// The root error type for opcbridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Session resource error, captured by the failing command.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Command actor error.
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),
}

impl BridgeError {
    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Session(e) => e.is_retryable(),
            BridgeError::Actor(_) => false,
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::Session(e) => e.error_type(),
            BridgeError::Actor(e) => e.error_type(),
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Errors raised by the session resource.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session is not connected.
    #[error("Session is not connected")]
    NotConnected,

    /// Read operation failed.
    #[error("Read failed for '{tag}': {message}")]
    ReadFailed {
        /// The tag that failed.
        tag: String,
        /// Error message.
        message: String,
    },

    /// Write operation failed.
    #[error("Write failed for '{tag}': {message}")]
    WriteFailed {
        /// The tag that failed.
        tag: String,
        /// Error message.
        message: String,
    },

    /// Subscription group operation failed.
    #[error("Subscription error: {message}")]
    Subscription {
        /// Error message.
        message: String,
    },
}

impl SessionError {
    /// Creates a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection failed error with a source.
    pub fn connection_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a read failed error.
    pub fn read_failed(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Creates a write failed error.
    pub fn write_failed(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Creates a subscription error.
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Connection-level failures may succeed on a later attempt once the
    /// session reconnects; malformed operations will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::ConnectionFailed { .. } | SessionError::NotConnected
        )
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            SessionError::ConnectionFailed { .. } => "connection_failed",
            SessionError::NotConnected => "not_connected",
            SessionError::ReadFailed { .. } => "read_failed",
            SessionError::WriteFailed { .. } => "write_failed",
            SessionError::Subscription { .. } => "subscription",
        }
    }
}

// =============================================================================
// ActorError
// =============================================================================

/// Errors raised by the command actor itself, as opposed to errors raised by
/// the commands it executes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActorError {
    /// Shutdown has begun; new submissions fail fast instead of blocking on a
    /// worker that will never run them.
    #[error("Actor is shutting down, command rejected")]
    ShuttingDown,

    /// The command queue has been closed.
    #[error("Command queue is closed")]
    Closed,

    /// The worker dropped the command's completion channel without replying.
    #[error("Worker exited before completing the command")]
    WorkerGone,
}

impl ActorError {
    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ActorError::ShuttingDown => "shutting_down",
            ActorError::Closed => "queue_closed",
            ActorError::WorkerGone => "worker_gone",
        }
    }
}

/// Convenience result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Convenience result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_helpers() {
        let e = SessionError::read_failed("tag1", "timeout");
        assert_eq!(e.error_type(), "read_failed");
        assert!(!e.is_retryable());
        assert!(e.to_string().contains("tag1"));

        let e = SessionError::connection_failed("refused");
        assert!(e.is_retryable());
        assert_eq!(e.error_type(), "connection_failed");
    }

    #[test]
    fn test_connection_failed_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "dial failed");
        let e = SessionError::connection_failed_with("could not reach server", io);

        assert!(e.is_retryable());
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().contains("could not reach server"));
    }

    #[test]
    fn test_bridge_error_from() {
        let e: BridgeError = SessionError::NotConnected.into();
        assert!(matches!(e, BridgeError::Session(_)));
        assert!(e.is_retryable());

        let e: BridgeError = ActorError::Closed.into();
        assert!(matches!(e, BridgeError::Actor(_)));
        assert!(!e.is_retryable());
        assert_eq!(e.error_type(), "queue_closed");
    }
}
