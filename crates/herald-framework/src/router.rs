//! Command resolution and invocation.
//!
//! The router turns message text into a command invocation:
//!
//! 1. Split the text on whitespace; nothing to split means nothing to do.
//! 2. The first token must start with the prefix (case-sensitive), otherwise
//!    the message is not a command.
//! 3. The rest of the first token is looked up among the top-level commands.
//! 4. While the next token names a child of the current command, descend.
//!    The first token that does not is where the arguments begin.
//! 5. The permission gate picks `on_command` or `on_permission_denied`.
//!
//! ```text
//! "!role add @x moderator"  ──▶  role ─▶ add     args = ["@x", "moderator"]
//! "!role"                   ──▶  role            args = []
//! "!bogus"                  ──▶  (nothing)
//! ```

use std::sync::Arc;

use tracing::{Instrument, debug, debug_span, error, trace};

use crate::command::{Command, CommandContext};
use crate::handler::invoke_guarded;
use crate::permission::PermissionGate;
use crate::registry::Registry;
use herald_core::{BoxedEvent, MessageReceived};

/// A command resolved from message text.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The deepest matching command.
    pub command: Arc<Command>,
    /// The token that matched `command`, prefix stripped.
    pub label: String,
    /// Unconsumed tokens.
    pub args: Vec<String>,
}

/// What routing a message did.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// Empty, or the first token lacks the prefix.
    NotCommand,
    /// Prefixed, but no command matched the label.
    NotFound,
    /// `on_command` ran and succeeded.
    Executed { command: Arc<Command> },
    /// `on_permission_denied` ran.
    Denied { command: Arc<Command> },
    /// A handler returned an error or panicked.
    Failed { command: Arc<Command> },
}

impl RouteOutcome {
    /// The resolved command, if any.
    pub fn command(&self) -> Option<&Arc<Command>> {
        match self {
            Self::Executed { command } | Self::Denied { command } | Self::Failed { command } => {
                Some(command)
            }
            Self::NotCommand | Self::NotFound => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }
}

enum Lookup {
    NotCommand,
    NotFound,
    Resolved(Resolution),
}

/// Top-level command registry plus the resolution algorithm.
#[derive(Debug, Default)]
pub struct CommandRouter {
    commands: Registry<Command>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The top-level command registry.
    pub fn commands(&self) -> &Registry<Command> {
        &self.commands
    }

    /// Registers a top-level command. Returns `false` if already registered.
    pub fn register(&self, command: Arc<Command>) -> bool {
        self.commands.register(command)
    }

    /// Unregisters a top-level command. Returns `false` if not registered.
    pub fn unregister(&self, command: &Arc<Command>) -> bool {
        self.commands.unregister(command)
    }

    /// Resolves `raw` against the registered commands.
    pub fn resolve(&self, raw: &str, prefix: &str) -> Option<Resolution> {
        match self.lookup(raw, prefix) {
            Lookup::Resolved(resolution) => Some(resolution),
            Lookup::NotCommand | Lookup::NotFound => None,
        }
    }

    fn lookup(&self, raw: &str, prefix: &str) -> Lookup {
        let mut tokens = raw.split_whitespace();

        let Some(first) = tokens.next() else {
            return Lookup::NotCommand;
        };
        let Some(label) = first.strip_prefix(prefix) else {
            return Lookup::NotCommand;
        };

        let Some(mut command) = self.commands.all().into_iter().find(|c| c.matches(label)) else {
            return Lookup::NotFound;
        };
        let mut label = label;

        let mut rest = tokens.peekable();
        while let Some(&token) = rest.peek() {
            match command.find_child(token) {
                Some(child) => {
                    command = child;
                    label = token;
                    rest.next();
                }
                None => break,
            }
        }

        Lookup::Resolved(Resolution {
            command,
            label: label.to_string(),
            args: rest.map(str::to_string).collect(),
        })
    }

    /// Resolves the message and runs the matching handler.
    pub async fn route(
        &self,
        message: &MessageReceived,
        event: &BoxedEvent,
        prefix: &str,
        gate: &PermissionGate,
    ) -> RouteOutcome {
        let resolution = match self.lookup(&message.content, prefix) {
            Lookup::NotCommand => return RouteOutcome::NotCommand,
            Lookup::NotFound => {
                trace!(content = %message.content, "No command matched");
                return RouteOutcome::NotFound;
            }
            Lookup::Resolved(resolution) => resolution,
        };

        let command = Arc::clone(&resolution.command);
        let span = debug_span!("command", command = command.name(), actor = message.author.id);
        self.invoke(message, event, resolution, gate)
            .instrument(span)
            .await
            .unwrap_or(RouteOutcome::Failed { command })
    }

    async fn invoke(
        &self,
        message: &MessageReceived,
        event: &BoxedEvent,
        resolution: Resolution,
        gate: &PermissionGate,
    ) -> Option<RouteOutcome> {
        let Resolution {
            command,
            label,
            args,
        } = resolution;

        let allowed = gate.allow(message.guild.as_ref(), &message.author, command.permission());
        let ctx = CommandContext::new(message, event.clone(), Arc::clone(&command), label, args);

        let handler = if allowed {
            debug!(args = ?ctx.args(), "Executing command");
            command.command_handler()
        } else {
            debug!(permission = %command.permission(), "Actor lacks permission");
            command.denied_handler()
        };

        if let Err(e) = invoke_guarded(handler.as_ref(), ctx).await {
            error!(
                command = command.name(),
                event = event.event_name(),
                error = %e,
                "Command handler failed"
            );
            return None;
        }

        Some(if allowed {
            RouteOutcome::Executed { command }
        } else {
            RouteOutcome::Denied { command }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use herald_core::{Channel, Guild, Permission, User};
    use parking_lot::Mutex;

    fn role_tree() -> (CommandRouter, Arc<Command>, Arc<Command>) {
        let add = Command::builder("add").build();
        let role = Command::builder("role").child(Arc::clone(&add)).build();
        let router = CommandRouter::new();
        router.register(Arc::clone(&role));
        (router, role, add)
    }

    fn guild_message(content: &str, author: &str) -> (MessageReceived, BoxedEvent) {
        let message = MessageReceived::in_guild(
            content,
            User::new(7, author),
            Channel::text(3, "general"),
            Guild::new(1, "home"),
        );
        let event = BoxedEvent::new(message.clone());
        (message, event)
    }

    #[test]
    fn test_resolves_sub_command_with_args() {
        let (router, _, add) = role_tree();

        let resolution = router.resolve("!role add @x moderator", "!").unwrap();
        assert!(Arc::ptr_eq(&resolution.command, &add));
        assert_eq!(resolution.label, "add");
        assert_eq!(resolution.args, vec!["@x", "moderator"]);
    }

    #[test]
    fn test_resolves_parent_without_args() {
        let (router, role, _) = role_tree();

        let resolution = router.resolve("!role", "!").unwrap();
        assert!(Arc::ptr_eq(&resolution.command, &role));
        assert!(resolution.args.is_empty());
    }

    #[test]
    fn test_descent_stops_at_first_unknown_token() {
        let (router, role, _) = role_tree();

        let resolution = router.resolve("!role   list add", "!").unwrap();
        assert!(Arc::ptr_eq(&resolution.command, &role));
        assert_eq!(resolution.args, vec!["list", "add"]);
    }

    #[test]
    fn test_name_and_alias_are_case_insensitive() {
        let router = CommandRouter::new();
        let ping = Command::builder("ping").alias("p").build();
        router.register(Arc::clone(&ping));

        let upper = router.resolve("!PING", "!").unwrap();
        let alias = router.resolve("!p", "!").unwrap();
        assert!(Arc::ptr_eq(&upper.command, &ping));
        assert!(Arc::ptr_eq(&alias.command, &ping));
        assert_eq!(upper.label, "PING");
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let router = CommandRouter::new();
        router.register(Command::builder("ping").build());

        assert!(router.resolve("hey!ping", "hey!").is_some());
        assert!(router.resolve("HEY!ping", "hey!").is_none());
        assert!(router.resolve("ping", "!").is_none());
        assert!(router.resolve("   ", "!").is_none());
    }

    #[test]
    fn test_first_registered_sibling_wins() {
        let router = CommandRouter::new();
        let first = Command::builder("dup").build();
        let second = Command::builder("other").alias("dup").build();
        router.register(Arc::clone(&first));
        router.register(second);

        let resolution = router.resolve("!dup", "!").unwrap();
        assert!(Arc::ptr_eq(&resolution.command, &first));
    }

    #[tokio::test]
    async fn test_unknown_command_is_a_silent_noop() {
        let (router, _, _) = role_tree();
        let (message, event) = guild_message("!bogus", "ann");

        let outcome = router
            .route(&message, &event, "!", &PermissionGate::allow_all())
            .await;
        assert!(matches!(outcome, RouteOutcome::NotFound));

        let (message, event) = guild_message("just chatting", "ann");
        let outcome = router
            .route(&message, &event, "!", &PermissionGate::allow_all())
            .await;
        assert!(matches!(outcome, RouteOutcome::NotCommand));
    }

    #[tokio::test]
    async fn test_gate_selects_handler() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (ok, denied) = (Arc::clone(&calls), Arc::clone(&calls));
        let kick = Command::builder("kick")
            .permission(Permission::KickMembers)
            .on_command(move |ctx: CommandContext| {
                ok.lock().push(format!("run {}", ctx.args().join(" ")));
                async { Ok(()) }
            })
            .on_permission_denied(move |ctx: CommandContext| {
                denied.lock().push(format!("denied {}", ctx.actor().name));
                async { Ok(()) }
            })
            .build();

        let router = CommandRouter::new();
        router.register(kick);
        let gate = PermissionGate::new(|_: &Guild, user: &User, _: &Permission| user.name == "mod");

        let (message, event) = guild_message("!kick troll", "mod");
        assert!(router.route(&message, &event, "!", &gate).await.is_executed());

        let (message, event) = guild_message("!kick mod", "troll");
        let outcome = router.route(&message, &event, "!", &gate).await;
        assert!(matches!(outcome, RouteOutcome::Denied { .. }));

        assert_eq!(*calls.lock(), vec!["run troll", "denied troll"]);
    }

    #[tokio::test]
    async fn test_direct_message_skips_permission_check() {
        let router = CommandRouter::new();
        router.register(
            Command::builder("ban")
                .permission(Permission::BanMembers)
                .build(),
        );
        let gate = PermissionGate::new(|_: &Guild, _: &User, _: &Permission| false);
        let message = MessageReceived::direct("!ban", User::new(1, "x"), Channel::private(9));
        let event = BoxedEvent::new(message.clone());

        assert!(router.route(&message, &event, "!", &gate).await.is_executed());
    }

    #[tokio::test]
    async fn test_handler_failure_is_contained() {
        let router = CommandRouter::new();
        router.register(
            Command::builder("fail")
                .on_command(|_| async { Err(HandlerError::msg("nope")) })
                .build(),
        );
        router.register(
            Command::builder("explode")
                .on_command(|_| async { panic!("kaboom") })
                .build(),
        );
        let gate = PermissionGate::allow_all();

        let (message, event) = guild_message("!fail", "ann");
        let outcome = router.route(&message, &event, "!", &gate).await;
        assert_eq!(outcome.command().map(|c| c.name()), Some("fail"));
        assert!(matches!(outcome, RouteOutcome::Failed { .. }));

        let (message, event) = guild_message("!explode", "ann");
        let outcome = router.route(&message, &event, "!", &gate).await;
        assert!(matches!(outcome, RouteOutcome::Failed { .. }));
    }
}
