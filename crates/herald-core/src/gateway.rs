//! Gateway integration seam.
//!
//! A [`Gateway`] owns the connection to the real-time messaging service. It
//! is given a single [`EventSink`] when started and pushes every inbound
//! event into it; everything downstream of the sink belongs to the dispatch
//! engine.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{GatewayResult, SinkError, SinkResult};
use crate::event::BoxedEvent;
use crate::model::Channel;

/// The external real-time messaging service.
///
/// # Example
///
/// ```rust,ignore
/// struct Console;
///
/// #[async_trait]
/// impl Gateway for Console {
///     fn name(&self) -> &str {
///         "console"
///     }
///
///     async fn start(&self, sink: EventSink) -> GatewayResult<()> {
///         tokio::spawn(async move {
///             let _ = sink.send(Ready::default()).await;
///         });
///         Ok(())
///     }
///
///     async fn stop(&self) -> GatewayResult<()> {
///         Ok(())
///     }
///
///     async fn send_message(&self, channel: &Channel, content: &str) -> GatewayResult<()> {
///         println!("#{}: {content}", channel.id);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Returns the gateway name (e.g., "discord").
    fn name(&self) -> &str;

    /// Logs in and starts delivering events into `sink`.
    ///
    /// Authentication and connection failures must be returned from here, not
    /// pushed into the sink.
    async fn start(&self, sink: EventSink) -> GatewayResult<()>;

    /// Closes the session. Events already handed to the sink are unaffected.
    async fn stop(&self) -> GatewayResult<()>;

    /// Posts a text message to a channel.
    async fn send_message(&self, channel: &Channel, content: &str) -> GatewayResult<()>;
}

/// A shared gateway handle.
pub type BoxedGateway = Arc<dyn Gateway>;

/// The single entry point gateways push inbound events into.
///
/// Cheap to clone. Backed by a bounded queue, so [`send`](Self::send) applies
/// backpressure to the gateway when dispatch falls behind.
#[derive(Clone)]
pub struct EventSink {
    sender: mpsc::Sender<BoxedEvent>,
}

impl EventSink {
    /// Wraps the sending half of a dispatch queue.
    pub fn new(sender: mpsc::Sender<BoxedEvent>) -> Self {
        Self { sender }
    }

    /// Queues an event, waiting for capacity.
    pub async fn send(&self, event: impl Into<BoxedEvent>) -> SinkResult<()> {
        self.sender
            .send(event.into())
            .await
            .map_err(|_| SinkError::Closed)
    }

    /// Queues an event without waiting.
    pub fn try_send(&self, event: impl Into<BoxedEvent>) -> SinkResult<()> {
        self.sender.try_send(event.into()).map_err(|e| match e {
            TrySendError::Full(event) => SinkError::Full(event),
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    /// Returns `true` once the dispatch side has shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Remaining queue capacity.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("closed", &self.is_closed())
            .field("capacity", &self.capacity())
            .finish()
    }
}
