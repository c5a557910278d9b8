//! Handler system for the Herald framework.
//!
//! Handlers are plain async closures. Listener handlers take the event,
//! command handlers take a [`CommandContext`](crate::CommandContext); both
//! return a [`HandlerResult`].
//!
//! ```rust,ignore
//! // Wildcard listener handler
//! let log_all = |event: BoxedEvent| async move {
//!     tracing::info!(event = event.event_name(), "seen");
//!     Ok(())
//! };
//!
//! // Command handler
//! let ping = |ctx: CommandContext| async move {
//!     println!("pong for {}", ctx.actor().name);
//!     Ok(())
//! };
//! ```
//!
//! Every call goes through [`invoke_guarded`], which turns a panic inside the
//! handler into [`HandlerError::Panicked`] so one broken handler cannot take
//! down the worker running the dispatch.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::{HandlerError, HandlerResult};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler<I>: Send + Sync {
    /// Starts the handler on `input`.
    fn call(&self, input: I) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut, I> ErasedHandler<I> for F
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, input: I) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(input))
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler<I> = Arc<dyn ErasedHandler<I>>;

/// Convert a closure into a boxed handler.
pub fn into_handler<I, F, Fut>(f: F) -> BoxedHandler<I>
where
    I: 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(f)
}

/// Runs a handler, converting panics (while building or polling its future)
/// into [`HandlerError::Panicked`].
pub async fn invoke_guarded<I>(handler: &dyn ErasedHandler<I>, input: I) -> HandlerResult {
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(input))) {
        Ok(future) => future,
        Err(payload) => return Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
