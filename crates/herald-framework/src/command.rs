//! Hierarchical commands.
//!
//! A [`Command`] is an immutable descriptor (name, aliases, required
//! permission, description) plus a mutable, ordered list of child commands
//! and two handlers: one run when the actor is allowed, one when not.
//!
//! ```rust,ignore
//! let add = Command::builder("add")
//!     .permission(Permission::ManageRoles)
//!     .on_command(|ctx: CommandContext| async move {
//!         tracing::info!(args = ?ctx.args(), "adding role");
//!         Ok(())
//!     })
//!     .build();
//!
//! let role = Command::builder("role")
//!     .alias("r")
//!     .child(add)
//!     .build();
//!
//! dispatcher.register_command(role);
//! ```
//!
//! Names and aliases compare case-insensitively. Siblings are not checked for
//! collisions; lookup takes the first match in registration order.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::error::HandlerResult;
use crate::handler::{BoxedHandler, into_handler};
use crate::registry::Registry;
use herald_core::{BoxedEvent, Channel, Guild, MessageReceived, Permission, User};

/// Handler type shared by `on_command` and `on_permission_denied`.
pub type CommandHandler = BoxedHandler<CommandContext>;

// ============================================================================
// Command
// ============================================================================

/// A node of the command tree.
pub struct Command {
    name: String,
    key: String,
    aliases: Vec<String>,
    alias_keys: Vec<String>,
    permission: Permission,
    description: Option<String>,
    children: Registry<Command>,
    on_command: CommandHandler,
    on_permission_denied: CommandHandler,
}

impl Command {
    /// Starts declaring a command.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::new(),
            permission: Permission::default(),
            description: None,
            children: Vec::new(),
            on_command: None,
            on_permission_denied: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The permission an actor needs inside a guild.
    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns `true` if `label` equals the name or one of the aliases,
    /// ignoring case.
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.key == label || self.alias_keys.iter().any(|a| *a == label)
    }

    /// Adds a child command. Returns `false` if it was already a child.
    pub fn add_child(&self, child: Arc<Command>) -> bool {
        self.children.register(child)
    }

    /// Removes a child command. Returns `false` if it was not a child.
    pub fn remove_child(&self, child: &Arc<Command>) -> bool {
        self.children.unregister(child)
    }

    pub fn contains_child(&self, child: &Arc<Command>) -> bool {
        self.children.contains(child)
    }

    /// Snapshot of the children in registration order.
    pub fn children(&self) -> Vec<Arc<Command>> {
        self.children.all()
    }

    pub fn clear_children(&self) {
        self.children.clear();
    }

    /// First child matching `label`, in registration order.
    pub fn find_child(&self, label: &str) -> Option<Arc<Command>> {
        self.children.all().into_iter().find(|c| c.matches(label))
    }

    pub(crate) fn command_handler(&self) -> &CommandHandler {
        &self.on_command
    }

    pub(crate) fn denied_handler(&self) -> &CommandHandler {
        &self.on_permission_denied
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("children", &self.children.len())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Declares a [`Command`].
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    permission: Permission,
    description: Option<String>,
    children: Vec<Arc<Command>>,
    on_command: Option<CommandHandler>,
    on_permission_denied: Option<CommandHandler>,
}

impl CommandBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the required permission (defaults to [`Permission::SendMessages`]).
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a child command.
    pub fn child(mut self, child: Arc<Command>) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the handler run when the actor is allowed.
    pub fn on_command<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_command = Some(into_handler(handler));
        self
    }

    /// Sets the handler run when the permission gate refuses the actor.
    pub fn on_permission_denied<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_permission_denied = Some(into_handler(handler));
        self
    }

    pub fn build(self) -> Arc<Command> {
        let children = Registry::new();
        for child in self.children {
            children.register(child);
        }

        Arc::new(Command {
            key: self.name.to_lowercase(),
            alias_keys: self.aliases.iter().map(|a| a.to_lowercase()).collect(),
            name: self.name,
            aliases: self.aliases,
            permission: self.permission,
            description: self.description,
            children,
            on_command: self.on_command.unwrap_or_else(|| {
                into_handler(|ctx: CommandContext| async move {
                    debug!(command = ctx.command().name(), "Command has no handler");
                    Ok(())
                })
            }),
            on_permission_denied: self.on_permission_denied.unwrap_or_else(|| {
                into_handler(|ctx: CommandContext| async move {
                    debug!(
                        command = ctx.command().name(),
                        actor = ctx.actor().id,
                        "Permission denied"
                    );
                    Ok(())
                })
            }),
        })
    }
}

// ============================================================================
// Command Context
// ============================================================================

/// Everything a command handler needs about one invocation.
#[derive(Clone)]
pub struct CommandContext {
    guild: Option<Guild>,
    channel: Channel,
    actor: User,
    label: String,
    args: Vec<String>,
    command: Arc<Command>,
    event: BoxedEvent,
}

impl CommandContext {
    /// Builds the context for `command`, resolved from `message`.
    pub fn new(
        message: &MessageReceived,
        event: BoxedEvent,
        command: Arc<Command>,
        label: String,
        args: Vec<String>,
    ) -> Self {
        Self {
            guild: message.guild.clone(),
            channel: message.channel.clone(),
            actor: message.author.clone(),
            label,
            args,
            command,
            event,
        }
    }

    /// The guild, absent for direct messages.
    pub fn guild(&self) -> Option<&Guild> {
        self.guild.as_ref()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The user who sent the command.
    pub fn actor(&self) -> &User {
        &self.actor
    }

    /// The token that matched the resolved command, as typed.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Tokens left after command resolution.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    /// The message event that triggered the command.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command.name())
            .field("label", &self.label)
            .field("args", &self.args)
            .field("actor", &self.actor)
            .field("guild", &self.guild)
            .finish()
    }
}
