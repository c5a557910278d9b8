//! Error types for the Herald core.
//!
//! Framework-level errors (binding and handler failures) are defined in
//! herald-framework.

use thiserror::Error;

use crate::event::BoxedEvent;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors raised by a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway rejected the credentials.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Reason for failure.
        reason: String,
    },

    /// The gateway could not be reached or the session dropped.
    #[error("connection failed: {reason}")]
    Connection {
        /// Reason for failure.
        reason: String,
    },

    /// The operation needs a running gateway session.
    #[error("gateway '{gateway}' is not running")]
    NotRunning {
        /// Gateway name.
        gateway: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),
}

impl GatewayError {
    /// Creates an authentication error.
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors returned when handing an event to an [`EventSink`](crate::EventSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The dispatch queue is full; the event is handed back.
    #[error("dispatch queue is full, dropped '{}'", .0.event_name())]
    Full(BoxedEvent),

    /// The dispatch queue has been shut down.
    #[error("dispatch queue is closed")]
    Closed,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;
