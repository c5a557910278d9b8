//! Event fan-out.
//!
//! The [`EventBus`] owns the listener registry and delivers each event to
//! every binding that accepts it. Matching is exact-type-or-wildcard; a
//! binding for one event type never sees another.
//!
//! Each handler runs in isolation: an `Err` or a panic is logged with the
//! listener name, binding index and event name, counted in the
//! [`DispatchReport`], and the remaining handlers still run.

use std::cmp::Reverse;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Instrument, debug_span, error, trace};

use crate::handler::invoke_guarded;
use crate::listener::{HandlerBinding, Listener};
use crate::priority::FanOutOrder;
use crate::registry::Registry;
use herald_core::BoxedEvent;

/// What a single fan-out did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that were run.
    pub invoked: usize,
    /// Handlers among those that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Number of handlers that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failed
    }
}

/// Delivers events to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Registry<Listener>,
    order: RwLock<FanOutOrder>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus with the given fan-out order.
    pub fn with_order(order: FanOutOrder) -> Self {
        Self {
            listeners: Registry::new(),
            order: RwLock::new(order),
        }
    }

    /// The listener registry.
    pub fn listeners(&self) -> &Registry<Listener> {
        &self.listeners
    }

    /// Registers a listener. Returns `false` if it was already registered.
    pub fn register(&self, listener: Arc<Listener>) -> bool {
        self.listeners.register(listener)
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, listener: &Arc<Listener>) -> bool {
        self.listeners.unregister(listener)
    }

    pub fn order(&self) -> FanOutOrder {
        *self.order.read()
    }

    pub fn set_order(&self, order: FanOutOrder) {
        *self.order.write() = order;
    }

    /// Fans `event` out to every matching binding.
    pub async fn dispatch(&self, event: &BoxedEvent) -> DispatchReport {
        let span = debug_span!("bus", event = event.event_name());
        self.fan_out(event).instrument(span).await
    }

    async fn fan_out(&self, event: &BoxedEvent) -> DispatchReport {
        let listeners = self.listeners.all();

        let mut targets: Vec<(&Listener, usize, &HandlerBinding)> = listeners
            .iter()
            .flat_map(|listener| {
                listener
                    .bindings()
                    .iter()
                    .enumerate()
                    .filter(|(_, binding)| binding.matches(event))
                    .map(move |(index, binding)| (listener.as_ref(), index, binding))
            })
            .collect();

        if self.order() == FanOutOrder::Priority {
            targets.sort_by_key(|(_, _, binding)| Reverse(binding.priority()));
        }

        let mut report = DispatchReport::default();
        for (listener, index, binding) in targets {
            trace!(listener = listener.name(), binding = index, "Invoking handler");
            report.invoked += 1;

            if let Err(e) = invoke_guarded(binding.handler().as_ref(), event.clone()).await {
                report.failed += 1;
                error!(
                    listener = listener.name(),
                    binding = index,
                    event = event.event_name(),
                    error = %e,
                    "Listener handler failed"
                );
            }
        }

        report
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("order", &self.order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HandlerError, HandlerResult};
    use crate::priority::Priority;
    use futures::future;
    use herald_core::{EventContext, Guild, MemberJoined, Ready, User};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn joined() -> BoxedEvent {
        BoxedEvent::new(MemberJoined {
            guild: Guild::new(1, "home"),
            user: User::new(2, "bob"),
        })
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(BoxedEvent) -> future::Ready<HandlerResult> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_exact_and_wildcard_matching() {
        let bus = EventBus::new();
        let typed = Arc::new(AtomicUsize::new(0));
        let other = Arc::new(AtomicUsize::new(0));
        let any = Arc::new(AtomicUsize::new(0));

        let t = Arc::clone(&typed);
        let o = Arc::clone(&other);
        let listener = Listener::builder("l")
            .on(move |_: EventContext<MemberJoined>| {
                t.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .on(move |_: EventContext<Ready>| {
                o.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .on_any(counting(&any))
            .build()
            .unwrap();
        bus.register(listener);

        let report = bus.dispatch(&joined()).await;
        assert_eq!(report, DispatchReport { invoked: 2, failed: 0 });
        assert_eq!(typed.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
        assert_eq!(any.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregistered_listener_is_never_invoked() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = Listener::builder("gone")
            .on_any(counting(&counter))
            .build()
            .unwrap();

        bus.register(Arc::clone(&listener));
        bus.unregister(&listener);

        let report = bus.dispatch(&joined()).await;
        assert_eq!(report.invoked, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_double_register_then_unregister_leaves_absent() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = Listener::builder("twice")
            .on_any(counting(&counter))
            .build()
            .unwrap();

        assert!(bus.register(Arc::clone(&listener)));
        assert!(!bus.register(Arc::clone(&listener)));
        bus.dispatch(&joined()).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        bus.unregister(&listener);
        assert!(!bus.listeners().contains(&listener));
        bus.dispatch(&joined()).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_handlers_do_not_stop_others() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let erroring = Listener::builder("erroring")
            .on_any(|_| async { Err(HandlerError::msg("bad")) })
            .build()
            .unwrap();
        let panicking = Listener::builder("panicking")
            .on_any(|_| async { panic!("worse") })
            .build()
            .unwrap();
        let healthy = Listener::builder("healthy")
            .on_any(counting(&counter))
            .build()
            .unwrap();

        bus.register(erroring);
        bus.register(panicking);
        bus.register(healthy);

        let report = bus.dispatch(&joined()).await;
        assert_eq!(report, DispatchReport { invoked: 3, failed: 2 });
        assert_eq!(report.succeeded(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    fn recording(
        log: &Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(BoxedEvent) -> future::Ready<HandlerResult> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_| {
            log.lock().push(tag);
            future::ready(Ok(()))
        }
    }

    fn prioritised_bus(log: &Arc<Mutex<Vec<&'static str>>>, order: FanOutOrder) -> EventBus {
        let bus = EventBus::with_order(order);
        let first = Listener::builder("first")
            .on_any_with_priority(Priority::Low, recording(log, "low"))
            .on_any_with_priority(Priority::Normal, recording(log, "normal-a"))
            .build()
            .unwrap();
        let second = Listener::builder("second")
            .on_any_with_priority(Priority::Highest, recording(log, "highest"))
            .on_any_with_priority(Priority::Normal, recording(log, "normal-b"))
            .build()
            .unwrap();
        bus.register(first);
        bus.register(second);
        bus
    }

    #[tokio::test]
    async fn test_priority_is_inert_by_default() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = prioritised_bus(&log, FanOutOrder::default());

        bus.dispatch(&joined()).await;
        assert_eq!(*log.lock(), vec!["low", "normal-a", "highest", "normal-b"]);
    }

    #[tokio::test]
    async fn test_priority_order_is_stable() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = prioritised_bus(&log, FanOutOrder::Priority);

        bus.dispatch(&joined()).await;
        assert_eq!(*log.lock(), vec!["highest", "normal-a", "normal-b", "low"]);
    }

    #[tokio::test]
    async fn test_handler_may_register_during_dispatch() {
        let bus = Arc::new(EventBus::new());
        let late = Listener::builder("late")
            .on_any(|_| async { Ok(()) })
            .build()
            .unwrap();

        let b = Arc::clone(&bus);
        let l = Arc::clone(&late);
        let registrar = Listener::builder("registrar")
            .on_any(move |_| {
                b.register(Arc::clone(&l));
                async { Ok(()) }
            })
            .build()
            .unwrap();
        bus.register(registrar);

        let report = bus.dispatch(&joined()).await;
        assert_eq!(report.invoked, 1);
        assert!(bus.listeners().contains(&late));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dispatch_during_concurrent_registration() {
        let bus = Arc::new(EventBus::new());
        let base = Arc::new(AtomicUsize::new(0));
        bus.register(
            Listener::builder("base")
                .on_any(counting(&base))
                .build()
                .unwrap(),
        );

        let churners: Vec<_> = (0..2)
            .map(|i| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    let listener = Listener::builder(format!("churn-{i}"))
                        .on_any(|_| async { Ok(()) })
                        .on(|_: EventContext<MemberJoined>| async { Ok(()) })
                        .build()
                        .unwrap();
                    for _ in 0..200 {
                        bus.register(Arc::clone(&listener));
                        tokio::task::yield_now().await;
                        bus.unregister(&listener);
                    }
                })
            })
            .collect();

        let dispatchers: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let report = bus.dispatch(&joined()).await;
                        // base, plus both bindings of each churning listener seen
                        assert!(report.invoked <= 5);
                        assert_eq!(report.invoked % 2, 1);
                        assert_eq!(report.failed, 0);
                    }
                })
            })
            .collect();

        for handle in churners.into_iter().chain(dispatchers) {
            handle.await.unwrap();
        }
        assert_eq!(base.load(Ordering::SeqCst), 800);
        assert_eq!(bus.listeners().len(), 1);
    }
}
