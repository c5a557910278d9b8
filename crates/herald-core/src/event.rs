//! Event system for the Herald framework.
//!
//! This module provides the core event infrastructure:
//!
//! - [`Event`] - Base trait for all events coming out of a gateway
//! - [`BoxedEvent`] - Type-erased, cheaply clonable event container
//! - [`EventKind`] - The kind a handler binding accepts (a concrete type or any)
//! - [`EventContext<T>`] - Typed view handed to typed handlers
//!
//! # Exact-type matching
//!
//! Event kinds are compared by concrete runtime type. There is no hierarchy:
//! a binding for one event type never sees another, and only
//! [`EventKind::Any`] sees everything.
//!
//! ```rust,ignore
//! use herald_core::{BoxedEvent, EventKind, MessageReceived, Ready};
//!
//! let event = BoxedEvent::new(Ready::default());
//! assert!(EventKind::of::<Ready>().accepts(&*event));
//! assert!(!EventKind::of::<MessageReceived>().accepts(&*event));
//! assert!(EventKind::Any.accepts(&*event));
//! ```

use std::any::{Any, TypeId};
use std::ops::Deref;
use std::sync::Arc;

use crate::events::MessageReceived;

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all events in the Herald framework.
///
/// Events are type-erased using `dyn Event` and can be downcast to concrete
/// types using `as_any()`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct Heartbeat {
///     latency_ms: u64,
/// }
///
/// impl Event for Heartbeat {
///     fn event_name(&self) -> &'static str {
///         "heartbeat"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait Event: Any + Send + Sync {
    /// Returns the human-readable name of this event type.
    fn event_name(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the message carried by this event, if it is a message event.
    ///
    /// The dispatcher routes every event for which this returns `Some`
    /// through the command router before fanning it out to listeners.
    fn as_message(&self) -> Option<&MessageReceived> {
        None
    }
}

// ============================================================================
// Event Kind
// ============================================================================

/// The kind of event a handler binding accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Wildcard: accepts every event.
    Any,
    /// Accepts only events whose concrete type is exactly this one.
    Exact {
        /// Type id of the concrete event type.
        id: TypeId,
        /// Type name, for diagnostics.
        name: &'static str,
    },
}

impl EventKind {
    /// The kind of the concrete event type `E`.
    pub fn of<E: Event>() -> Self {
        Self::Exact {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Returns `true` if an event of this concrete type, or any event for the
    /// wildcard kind, should be delivered.
    pub fn accepts(&self, event: &dyn Event) -> bool {
        match self {
            Self::Any => true,
            Self::Exact { id, .. } => event.as_any().type_id() == *id,
        }
    }

    /// Returns `true` for the wildcard kind.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// A short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Exact { name, .. } => name,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any type implementing [`Event`] in an `Arc`, so it can
/// be handed to every handler of a dispatch without copying the payload.
///
/// `BoxedEvent` implements `Deref<Target = dyn Event>`, allowing trait
/// methods to be called directly:
///
/// ```rust,ignore
/// let event: BoxedEvent = /* ... */;
/// let name = event.event_name();
/// let message = event.as_message();
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.inner.as_ref().as_any().downcast_ref()
    }

    /// Returns `true` if the concrete type of this event is `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Type id of the concrete event type.
    pub fn kind_id(&self) -> TypeId {
        self.inner.as_ref().as_any().type_id()
    }

    /// Extracts a typed, owned view of this event.
    pub fn extract<E: Event + Clone>(&self) -> Option<EventContext<E>> {
        self.downcast_ref::<E>()
            .map(|data| EventContext::new(data.clone(), self.clone()))
    }
}

impl Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_name", &self.event_name())
            .finish()
    }
}

impl<E: Event> From<E> for BoxedEvent {
    fn from(event: E) -> Self {
        BoxedEvent::new(event)
    }
}

// ============================================================================
// Event Context
// ============================================================================

/// Typed view of an event handed to typed handlers.
///
/// Use `Deref` to access fields directly on the wrapped type; the original
/// [`BoxedEvent`] stays reachable through [`root`](Self::root).
#[derive(Clone)]
pub struct EventContext<T: Event + Clone> {
    data: T,
    root: BoxedEvent,
}

impl<T: Event + Clone> EventContext<T> {
    /// Creates a new EventContext with the given data.
    pub fn new(data: T, root: BoxedEvent) -> Self {
        Self { data, root }
    }

    /// Returns the extracted event data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the context, returning the event data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns the type-erased event this view was extracted from.
    pub fn root(&self) -> &BoxedEvent {
        &self.root
    }
}

impl<T: Event + Clone> Deref for EventContext<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T: Event + Clone + std::fmt::Debug> std::fmt::Debug for EventContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemberJoined, Ready};
    use crate::model::{Guild, User};

    #[derive(Clone, Debug)]
    struct Heartbeat {
        latency_ms: u64,
    }

    impl Event for Heartbeat {
        fn event_name(&self) -> &'static str {
            "heartbeat"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_exact_kind_matches_only_its_type() {
        let event = BoxedEvent::new(Heartbeat { latency_ms: 12 });

        assert!(EventKind::of::<Heartbeat>().accepts(&*event));
        assert!(!EventKind::of::<Ready>().accepts(&*event));
    }

    #[test]
    fn test_any_kind_matches_everything() {
        let ready = BoxedEvent::new(Ready::default());
        let joined = BoxedEvent::new(MemberJoined {
            guild: Guild::new(1, "guild"),
            user: User::new(2, "someone"),
        });

        assert!(EventKind::Any.accepts(&*ready));
        assert!(EventKind::Any.accepts(&*joined));
        assert!(EventKind::Any.is_any());
    }

    #[test]
    fn test_downcast_and_extract() {
        let event = BoxedEvent::new(Heartbeat { latency_ms: 40 });

        assert!(event.is::<Heartbeat>());
        assert!(!event.is::<Ready>());
        assert_eq!(event.downcast_ref::<Heartbeat>().unwrap().latency_ms, 40);

        let ctx = event.extract::<Heartbeat>().unwrap();
        assert_eq!(ctx.latency_ms, 40);
        assert_eq!(ctx.root().event_name(), "heartbeat");
        assert!(event.extract::<Ready>().is_none());
    }

    #[test]
    fn test_kind_id_is_concrete_type() {
        let event = BoxedEvent::new(Heartbeat { latency_ms: 1 });
        assert_eq!(event.kind_id(), TypeId::of::<Heartbeat>());
    }

    #[test]
    fn test_non_message_event_has_no_message() {
        let event = BoxedEvent::new(Heartbeat { latency_ms: 1 });
        assert!(event.as_message().is_none());
    }
}
