//! # Herald Core
//!
//! The foundation of the Herald bot framework.
//!
//! This crate holds the types every other layer agrees on:
//!
//! - **Event System**: Type-erased events with runtime downcasting ([`Event`],
//!   [`BoxedEvent`]) and exact-type matching ([`EventKind`])
//! - **Data Carriers**: [`User`], [`Channel`], [`Guild`] and the built-in
//!   gateway events ([`MessageReceived`], [`Ready`], ...)
//! - **Permissions**: the [`Permission`] token and the [`MembershipLookup`] seam
//! - **Gateway Seam**: the [`Gateway`] trait and the [`EventSink`] it pushes into
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────┐     ┌───────────┐     ┌─────────────────────────────┐
//! │   Gateway   │────▶│ EventSink │────▶│ herald-framework Dispatcher │
//! │  (Discord)  │     │  (queue)  │     │  router ─▶ bus ─▶ listeners │
//! └─────────────┘     └───────────┘     └─────────────────────────────┘
//! ```

pub mod error;
pub mod event;
pub mod events;
pub mod gateway;
pub mod model;
pub mod permission;

pub use error::{GatewayError, GatewayResult, SinkError, SinkResult};
pub use event::{BoxedEvent, Event, EventContext, EventKind};
pub use events::{MemberJoined, MemberLeft, MessageReceived, OnlineStatus, PresenceUpdated, Ready};
pub use gateway::{BoxedGateway, EventSink, Gateway};
pub use model::{Channel, ChannelKind, Guild, User};
pub use permission::{MembershipLookup, Permission};

/// Prelude for common imports.
pub mod prelude {
    pub use super::event::*;
    pub use super::events::*;
    pub use super::gateway::{EventSink, Gateway};
    pub use super::model::*;
    pub use super::permission::{MembershipLookup, Permission};
}
