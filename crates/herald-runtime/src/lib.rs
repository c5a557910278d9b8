//! Herald Runtime - the shell around the dispatch engine.
//!
//! This crate provides:
//! - Layered configuration (`herald.toml`, profiles, `HERALD_*` environment)
//! - Logging setup through `tracing-subscriber`
//! - YAML files a bot keeps its own settings in (`FileManager`)
//! - The `Bot`, which connects a gateway to a worker pool and dispatcher
//!
//! ```ignore
//! use herald_runtime::Bot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = Bot::builder(Arc::new(MyGateway::new()))
//!         .gate(PermissionGate::new(role_cache))
//!         .build()?;
//!
//!     bot.register_command(ping_command());
//!
//!     // Run until Ctrl+C
//!     bot.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod files;
pub mod logging;

// Re-exports
pub use bot::{Bot, BotBuilder};
pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, Profile};
pub use error::{FileError, FileResult, RuntimeError, RuntimeResult};
pub use files::{ConfigFile, FileManager};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the logging macros alongside the runtime types:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `instrument` attribute
pub mod prelude {
    pub use super::{Bot, ConfigFile, HeraldConfig};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
