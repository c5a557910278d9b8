//! Configuration module for the Herald runtime.
//!
//! Layered loading (defaults, files, environment, overrides) through figment,
//! plus validation of the result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotSettings, DispatchConfig, FileEntry, HeraldConfig, LogFormat, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
