//! Error types for the Herald framework.

use herald_core::GatewayError;
use thiserror::Error;

/// A listener was declared with a binding the bus cannot dispatch to.
///
/// Returned from [`ListenerBuilder::build`](crate::ListenerBuilder::build);
/// this is a configuration mistake and should stop the registrant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A binding has no event kind, so it is unknown which events it wants.
    #[error("listener '{listener}': binding #{index} declares no event kind")]
    MissingEventKind {
        /// Listener name.
        listener: String,
        /// Position of the offending binding.
        index: usize,
    },

    /// The listener has nothing to dispatch to.
    #[error("listener '{listener}' declares no handler bindings")]
    NoBindings {
        /// Listener name.
        listener: String,
    },
}

/// Failure reported by a listener or command handler.
///
/// Handler failures never leave the dispatch: they are logged together with
/// the handler's identity and the triggering event, and the remaining
/// handlers still run.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Free-form failure message.
    #[error("{0}")]
    Message(String),

    /// A typed handler received an event of another type.
    #[error("event type mismatch: expected '{expected}', got '{got}'")]
    EventTypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual event name.
        got: &'static str,
    },

    /// Replying through the gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Creates a free-form handler error.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Wraps an arbitrary error.
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Result type returned by handlers.
pub type HandlerResult = Result<(), HandlerError>;
