//! # Herald
//!
//! An event-driven dispatch engine for chat bots.
//!
//! ## Overview
//!
//! A gateway (Discord or anything like it) pushes inbound events into Herald.
//! Herald turns each one into handler calls: prefixed chat messages are parsed
//! against a tree of commands, and every event is fanned out to the listeners
//! bound to its type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌───────────┐   ┌──────────────┐   ┌─────────────────────────┐
//! │ Gateway │──▶│ EventSink │──▶│ worker pool  │──▶│ Dispatcher              │
//! │         │   │  (queue)  │   │  (N workers) │   │  1. CommandRouter       │──▶ on_command
//! └─────────┘   └───────────┘   └──────────────┘   │     └─ PermissionGate   │──▶ on_permission_denied
//!                                                  │  2. EventBus            │──▶ listeners
//!                                                  └─────────────────────────┘
//! ```
//!
//! - **Gateway**: owns the connection and feeds the sink
//! - **Dispatcher**: routes commands first, then fans the event out to listeners
//! - **Listeners**: handler bundles, each handler bound to one event type or to all
//! - **Commands**: named, aliased, nestable; guarded by a permission token
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Without a gate, guild commands are denied; direct messages always pass
//!     let bot = Bot::builder(Arc::new(MyGateway::new()))
//!         .gate(PermissionGate::new(|_: &Guild, user: &User, _: &Permission| {
//!             user.id == OWNER_ID
//!         }))
//!         .build()?;
//!
//!     bot.register_command(
//!         Command::builder("ping")
//!             .alias("p")
//!             .on_command(|ctx: CommandContext| async move {
//!                 info!(actor = %ctx.actor().name, "pong");
//!                 Ok(())
//!             })
//!             .build(),
//!     );
//!
//!     bot.listen(
//!         Listener::builder("welcome")
//!             .on(|ev: EventContext<MemberJoined>| async move {
//!                 info!(user = %ev.data().user.name, "joined");
//!                 Ok(())
//!             }),
//!     )?;
//!
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `herald.toml` (default)
//! - `yaml-config`: load `herald.yaml`
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

pub use herald_core::{BoxedEvent, Event, EventContext, EventKind};
pub use herald_runtime::tracing;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use herald_runtime::{Bot, BotBuilder, HeraldConfig, RuntimeError, RuntimeResult};

    // Events and data carriers
    pub use herald_core::prelude::*;
    pub use herald_core::{GatewayError, GatewayResult, SinkError};

    // Listeners and commands
    pub use herald_framework::{
        Command, CommandContext, DispatchOutcome, Dispatcher, FanOutOrder, HandlerError,
        HandlerResult, Listener, PermissionGate, Priority, RouteOutcome,
    };

    // Logging macros
    pub use herald_runtime::tracing::{debug, error, info, trace, warn};
}
