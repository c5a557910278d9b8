//! Listeners and their handler bindings.
//!
//! A [`Listener`] is a named, ordered group of [`HandlerBinding`]s. Each
//! binding says which [`EventKind`] it accepts, at what [`Priority`], and
//! what to run. Listeners are declared with a [`ListenerBuilder`] and are
//! validated once, at [`build`](ListenerBuilder::build) time.
//!
//! ```rust,ignore
//! let audit = Listener::builder("audit")
//!     .on(|ev: EventContext<MemberJoined>| async move {
//!         tracing::info!(user = %ev.user.name, "joined");
//!         Ok(())
//!     })
//!     .on_any(|event: BoxedEvent| async move {
//!         tracing::trace!(event = event.event_name(), "seen");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! dispatcher.register_listener(audit);
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future;
use herald_core::{BoxedEvent, Event, EventContext, EventKind};

use crate::error::{BindError, BindResult, HandlerError, HandlerResult};
use crate::handler::{BoxFuture, BoxedHandler, into_handler};
use crate::priority::Priority;

// ============================================================================
// Binding
// ============================================================================

/// One handler of a listener, with the event kind it accepts.
#[derive(Clone)]
pub struct HandlerBinding {
    accepts: EventKind,
    priority: Priority,
    handler: BoxedHandler<BoxedEvent>,
}

impl HandlerBinding {
    /// The event kind this binding accepts.
    pub fn accepts(&self) -> EventKind {
        self.accepts
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn handler(&self) -> &BoxedHandler<BoxedEvent> {
        &self.handler
    }

    /// Returns `true` if this binding should see `event`.
    pub fn matches(&self, event: &BoxedEvent) -> bool {
        self.accepts.accepts(&**event)
    }
}

impl std::fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("accepts", &self.accepts)
            .field("priority", &self.priority)
            .finish()
    }
}

// ============================================================================
// Listener
// ============================================================================

/// A named group of handler bindings.
///
/// Shared as `Arc<Listener>`; registries identify it by that `Arc`.
pub struct Listener {
    name: String,
    bindings: Vec<HandlerBinding>,
}

impl Listener {
    /// Starts declaring a listener.
    pub fn builder(name: impl Into<String>) -> ListenerBuilder {
        ListenerBuilder {
            name: name.into(),
            specs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bindings in declaration order.
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

// ============================================================================
// Handler spec
// ============================================================================

/// An explicit, not yet validated binding.
///
/// Useful when bindings come out of a table rather than builder calls. A spec
/// without [`kind`](Self::kind) is rejected by [`ListenerBuilder::build`].
pub struct HandlerSpec {
    kind: Option<EventKind>,
    priority: Priority,
    handler: BoxedHandler<BoxedEvent>,
}

impl HandlerSpec {
    /// A spec running `handler` with the raw event.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(BoxedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_handler(into_handler(handler))
    }

    /// A spec running an already boxed handler.
    pub fn from_handler(handler: BoxedHandler<BoxedEvent>) -> Self {
        Self {
            kind: None,
            priority: Priority::default(),
            handler,
        }
    }

    /// Sets the event kind the binding accepts.
    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Declares the bindings of a [`Listener`].
pub struct ListenerBuilder {
    name: String,
    specs: Vec<HandlerSpec>,
}

impl ListenerBuilder {
    /// Binds a typed handler for events of exactly type `E`.
    pub fn on<E, F, Fut>(self, handler: F) -> Self
    where
        E: Event + Clone,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_with_priority::<E, F, Fut>(Priority::default(), handler)
    }

    /// Binds a typed handler at the given priority.
    pub fn on_with_priority<E, F, Fut>(mut self, priority: Priority, handler: F) -> Self
    where
        E: Event + Clone,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let erased = move |event: BoxedEvent| -> BoxFuture<'static, HandlerResult> {
            match event.extract::<E>() {
                Some(ctx) => Box::pin(handler(ctx)),
                None => Box::pin(future::ready(Err(HandlerError::EventTypeMismatch {
                    expected: std::any::type_name::<E>(),
                    got: event.event_name(),
                }))),
            }
        };

        self.specs.push(
            HandlerSpec::new(erased)
                .kind(EventKind::of::<E>())
                .priority(priority),
        );
        self
    }

    /// Binds a wildcard handler that sees every event.
    pub fn on_any<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(BoxedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_any_with_priority(Priority::default(), handler)
    }

    /// Binds a wildcard handler at the given priority.
    pub fn on_any_with_priority<F, Fut>(mut self, priority: Priority, handler: F) -> Self
    where
        F: Fn(BoxedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.specs.push(
            HandlerSpec::new(handler)
                .kind(EventKind::Any)
                .priority(priority),
        );
        self
    }

    /// Adds an explicit binding.
    pub fn bind(mut self, spec: HandlerSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validates the bindings and produces the shared listener.
    pub fn build(self) -> BindResult<Arc<Listener>> {
        if self.specs.is_empty() {
            return Err(BindError::NoBindings {
                listener: self.name,
            });
        }

        let mut bindings = Vec::with_capacity(self.specs.len());
        for (index, spec) in self.specs.into_iter().enumerate() {
            let Some(accepts) = spec.kind else {
                return Err(BindError::MissingEventKind {
                    listener: self.name,
                    index,
                });
            };
            bindings.push(HandlerBinding {
                accepts,
                priority: spec.priority,
                handler: spec.handler,
            });
        }

        Ok(Arc::new(Listener {
            name: self.name,
            bindings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::invoke_guarded;
    use herald_core::{Channel, MessageReceived, Ready, User};

    fn message(content: &str) -> BoxedEvent {
        BoxedEvent::new(MessageReceived::direct(
            content,
            User::new(1, "alice"),
            Channel::private(1),
        ))
    }

    #[test]
    fn test_build_keeps_declaration_order() {
        let listener = Listener::builder("mixed")
            .on::<Ready, _, _>(|_| async { Ok(()) })
            .on_any(|_| async { Ok(()) })
            .on_with_priority::<MessageReceived, _, _>(Priority::High, |_| async { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(listener.name(), "mixed");
        let kinds: Vec<_> = listener.bindings().iter().map(|b| b.accepts()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::of::<Ready>(),
                EventKind::Any,
                EventKind::of::<MessageReceived>()
            ]
        );
        assert_eq!(listener.bindings()[2].priority(), Priority::High);
    }

    #[test]
    fn test_empty_listener_is_rejected() {
        let err = Listener::builder("empty").build().unwrap_err();
        assert_eq!(
            err,
            BindError::NoBindings {
                listener: "empty".into()
            }
        );
    }

    #[test]
    fn test_spec_without_kind_is_rejected() {
        let err = Listener::builder("table")
            .bind(HandlerSpec::new(|_| async { Ok(()) }).kind(EventKind::Any))
            .bind(HandlerSpec::new(|_| async { Ok(()) }))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            BindError::MissingEventKind {
                listener: "table".into(),
                index: 1
            }
        );
    }

    #[test]
    fn test_binding_matches_exact_type_or_wildcard() {
        let listener = Listener::builder("l")
            .on::<Ready, _, _>(|_| async { Ok(()) })
            .on_any(|_| async { Ok(()) })
            .build()
            .unwrap();

        let event = message("hi");
        assert!(!listener.bindings()[0].matches(&event));
        assert!(listener.bindings()[1].matches(&event));
    }

    #[tokio::test]
    async fn test_typed_handler_receives_typed_view() {
        let listener = Listener::builder("typed")
            .on::<MessageReceived, _, _>(|msg: EventContext<MessageReceived>| async move {
                if msg.content == "hello" {
                    Ok(())
                } else {
                    Err(HandlerError::msg("wrong content"))
                }
            })
            .build()
            .unwrap();

        let handler = listener.bindings()[0].handler();
        assert!(invoke_guarded(handler.as_ref(), message("hello")).await.is_ok());

        let err = invoke_guarded(handler.as_ref(), BoxedEvent::new(Ready::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::EventTypeMismatch { got: "ready", .. }));
    }
}
