//! # Herald Framework
//!
//! The dispatch engine of the Herald bot framework.
//!
//! This layer provides:
//! - Listeners with typed or wildcard handler bindings ([`Listener`])
//! - Exact-type-or-wildcard event fan-out ([`EventBus`])
//! - Hierarchical, case-insensitive commands ([`Command`], [`CommandRouter`])
//! - Guild permission checks ([`PermissionGate`])
//! - The per-event entry point ([`Dispatcher`]) and a bounded worker pool
//!   ([`WorkerPool`]) feeding it
//!
//! Handler failures are contained: errors and panics are logged and counted,
//! never propagated out of a dispatch.

pub mod bus;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod listener;
pub mod permission;
pub mod pool;
pub mod priority;
pub mod registry;
pub mod router;

pub use bus::{DispatchReport, EventBus};
pub use command::{Command, CommandBuilder, CommandContext, CommandHandler};
pub use dispatcher::{DEFAULT_PREFIX, DispatchOutcome, Dispatcher};
pub use error::{BindError, BindResult, HandlerError, HandlerResult};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, into_handler, invoke_guarded};
pub use listener::{HandlerBinding, HandlerSpec, Listener, ListenerBuilder};
pub use permission::PermissionGate;
pub use pool::{PoolConfig, WorkerPool};
pub use priority::{FanOutOrder, Priority};
pub use registry::Registry;
pub use router::{CommandRouter, Resolution, RouteOutcome};
