//! Dispatch entry point.
//!
//! The [`Dispatcher`] is what every inbound event goes through. It owns the
//! [`EventBus`], the [`CommandRouter`], the [`PermissionGate`] and the
//! command prefix.
//!
//! For each event:
//!
//! 1. If the event carries a message, route it through the command router.
//! 2. Fan the event out to listeners on the bus, whether or not a command ran.
//!
//! Both steps run on the caller's task, router first.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new()
//!     .with_prefix("?")
//!     .with_gate(PermissionGate::new(role_cache));
//!
//! dispatcher.register_listener(audit);
//! dispatcher.register_command(ping);
//!
//! let outcome = dispatcher.dispatch(BoxedEvent::new(message)).await;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Instrument, debug, debug_span};

use crate::bus::{DispatchReport, EventBus};
use crate::command::Command;
use crate::listener::Listener;
use crate::permission::PermissionGate;
use crate::priority::FanOutOrder;
use crate::router::{CommandRouter, RouteOutcome};
use herald_core::BoxedEvent;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "!";

/// What one dispatch did.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Routing result; `None` when the event carries no message.
    pub route: Option<RouteOutcome>,
    /// Listener fan-out result.
    pub bus: DispatchReport,
}

/// The central event dispatcher.
///
/// `Dispatcher` is `Send + Sync`; share it behind an `Arc` and call
/// [`dispatch`](Self::dispatch) from as many tasks as needed.
pub struct Dispatcher {
    bus: EventBus,
    router: CommandRouter,
    gate: RwLock<PermissionGate>,
    prefix: RwLock<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with no listeners or commands, the `!` prefix,
    /// registration-order fan-out and [`PermissionGate::deny_all`].
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
            router: CommandRouter::new(),
            gate: RwLock::new(PermissionGate::deny_all()),
            prefix: RwLock::new(DEFAULT_PREFIX.to_string()),
        }
    }

    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        self.set_prefix(prefix);
        self
    }

    pub fn with_gate(self, gate: PermissionGate) -> Self {
        self.set_gate(gate);
        self
    }

    pub fn with_fan_out(self, order: FanOutOrder) -> Self {
        self.bus.set_order(order);
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    /// Registers a listener. Registering it again has no effect.
    pub fn register_listener(&self, listener: Arc<Listener>) -> bool {
        let added = self.bus.register(Arc::clone(&listener));
        if added {
            debug!(listener = listener.name(), "Listener registered");
        }
        added
    }

    pub fn unregister_listener(&self, listener: &Arc<Listener>) -> bool {
        let removed = self.bus.unregister(listener);
        if removed {
            debug!(listener = listener.name(), "Listener unregistered");
        }
        removed
    }

    pub fn contains_listener(&self, listener: &Arc<Listener>) -> bool {
        self.bus.listeners().contains(listener)
    }

    /// Snapshot of the registered listeners.
    pub fn listeners(&self) -> Vec<Arc<Listener>> {
        self.bus.listeners().all()
    }

    pub fn clear_listeners(&self) {
        self.bus.listeners().clear();
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Registers a top-level command. Registering it again has no effect.
    pub fn register_command(&self, command: Arc<Command>) -> bool {
        let added = self.router.register(Arc::clone(&command));
        if added {
            debug!(command = command.name(), "Command registered");
        }
        added
    }

    pub fn unregister_command(&self, command: &Arc<Command>) -> bool {
        let removed = self.router.unregister(command);
        if removed {
            debug!(command = command.name(), "Command unregistered");
        }
        removed
    }

    pub fn contains_command(&self, command: &Arc<Command>) -> bool {
        self.router.commands().contains(command)
    }

    /// Snapshot of the top-level commands.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.router.commands().all()
    }

    pub fn clear_commands(&self) {
        self.router.commands().clear();
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        *self.prefix.write() = prefix.into();
    }

    pub fn prefix(&self) -> String {
        self.prefix.read().clone()
    }

    pub fn set_gate(&self, gate: PermissionGate) {
        *self.gate.write() = gate;
    }

    pub fn set_fan_out(&self, order: FanOutOrder) {
        self.bus.set_order(order);
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Routes `event` through the command router (message events only), then
    /// fans it out to listeners.
    pub async fn dispatch(&self, event: impl Into<BoxedEvent>) -> DispatchOutcome {
        let event = event.into();
        let span = debug_span!("dispatch", event = event.event_name());
        self.handle(event).instrument(span).await
    }

    async fn handle(&self, event: BoxedEvent) -> DispatchOutcome {
        let route = match event.as_message() {
            Some(message) => {
                let prefix = self.prefix();
                let gate = self.gate.read().clone();
                Some(self.router.route(message, &event, &prefix, &gate).await)
            }
            None => None,
        };

        let bus = self.bus.dispatch(&event).await;

        DispatchOutcome { route, bus }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.bus.listeners().len())
            .field("commands", &self.router.commands().len())
            .field("prefix", &*self.prefix.read())
            .field("fan_out", &self.bus.order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandContext;
    use herald_core::{Channel, EventContext, Guild, MessageReceived, Ready, User};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dm(content: &str) -> MessageReceived {
        MessageReceived::direct(content, User::new(1, "ann"), Channel::private(5))
    }

    #[tokio::test]
    async fn test_command_runs_before_listeners() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = Arc::clone(&log);
        dispatcher.register_command(
            Command::builder("ping")
                .on_command(move |_: CommandContext| {
                    l.lock().push("command");
                    async { Ok(()) }
                })
                .build(),
        );
        let l = Arc::clone(&log);
        dispatcher.register_listener(
            Listener::builder("messages")
                .on(move |_: EventContext<MessageReceived>| {
                    l.lock().push("listener");
                    async { Ok(()) }
                })
                .build()
                .unwrap(),
        );

        let outcome = dispatcher.dispatch(dm("!ping")).await;
        assert!(outcome.route.unwrap().is_executed());
        assert_eq!(outcome.bus.invoked, 1);
        assert_eq!(*log.lock(), vec!["command", "listener"]);
    }

    #[tokio::test]
    async fn test_non_message_events_skip_router() {
        let dispatcher = Dispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        dispatcher.register_listener(
            Listener::builder("ready")
                .on(move |_: EventContext<Ready>| {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                })
                .build()
                .unwrap(),
        );

        let outcome = dispatcher.dispatch(Ready::default()).await;
        assert!(outcome.route.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_still_reaches_listeners() {
        let dispatcher = Dispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        dispatcher.register_listener(
            Listener::builder("all")
                .on_any(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                })
                .build()
                .unwrap(),
        );

        let outcome = dispatcher.dispatch(dm("!bogus")).await;
        assert!(matches!(outcome.route, Some(RouteOutcome::NotFound)));
        assert_eq!(outcome.bus.failed, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prefix_can_change() {
        let dispatcher = Dispatcher::new().with_prefix("?");
        let ping = Command::builder("ping").build();
        dispatcher.register_command(Arc::clone(&ping));

        assert_eq!(dispatcher.prefix(), "?");
        let outcome = dispatcher.dispatch(dm("!ping")).await;
        assert!(matches!(outcome.route, Some(RouteOutcome::NotCommand)));

        let outcome = dispatcher.dispatch(dm("?ping")).await;
        assert!(outcome.route.unwrap().is_executed());

        dispatcher.set_prefix("!");
        assert!(dispatcher.dispatch(dm("!ping")).await.route.unwrap().is_executed());
    }

    #[tokio::test]
    async fn test_guild_commands_need_a_gate() {
        let dispatcher = Dispatcher::new();
        dispatcher.register_command(Command::builder("ping").build());
        let in_guild = MessageReceived::in_guild(
            "!ping",
            User::new(1, "ann"),
            Channel::text(5, "general"),
            Guild::new(9, "home"),
        );

        let outcome = dispatcher.dispatch(in_guild.clone()).await;
        assert!(matches!(outcome.route, Some(RouteOutcome::Denied { .. })));

        dispatcher.set_gate(PermissionGate::allow_all());
        assert!(dispatcher.dispatch(in_guild).await.route.unwrap().is_executed());
    }

    #[test]
    fn test_registration_surface() {
        let dispatcher = Dispatcher::new();
        let listener = Listener::builder("l")
            .on_any(|_| async { Ok(()) })
            .build()
            .unwrap();
        let command = Command::builder("c").build();

        assert!(dispatcher.register_listener(Arc::clone(&listener)));
        assert!(!dispatcher.register_listener(Arc::clone(&listener)));
        assert!(dispatcher.register_command(Arc::clone(&command)));
        assert!(!dispatcher.register_command(Arc::clone(&command)));
        assert_eq!(dispatcher.listeners().len(), 1);
        assert_eq!(dispatcher.commands().len(), 1);

        assert!(dispatcher.unregister_listener(&listener));
        assert!(dispatcher.unregister_command(&command));
        assert!(!dispatcher.contains_listener(&listener));
        assert!(!dispatcher.contains_command(&command));

        dispatcher.register_listener(listener);
        dispatcher.register_command(command);
        dispatcher.clear_listeners();
        dispatcher.clear_commands();
        assert!(dispatcher.listeners().is_empty());
        assert!(dispatcher.commands().is_empty());
    }
}
