//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use herald_framework::{FanOutOrder, PoolConfig};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HeraldConfig {
    /// Bot identity and command settings.
    #[serde(default)]
    pub bot: BotSettings,

    /// Dispatch engine settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named YAML files managed by the bot's file store.
    #[serde(default)]
    pub files: HashMap<String, FileEntry>,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot identity and command settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotSettings {
    /// Command prefix (e.g. `!` in `!ping`).
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Gateway login token, handed to the gateway implementation.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            token: None,
        }
    }
}

fn default_prefix() -> String {
    herald_framework::DEFAULT_PREFIX.to_string()
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Number of dispatch workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the inbound event queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Listener fan-out order.
    #[serde(default)]
    pub fan_out: FanOutOrder,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            fan_out: FanOutOrder::default(),
        }
    }
}

impl DispatchConfig {
    /// Worker pool sizing.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }
}

fn default_workers() -> usize {
    PoolConfig::default().workers
}

fn default_queue_capacity() -> usize {
    PoolConfig::default().queue_capacity
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Which span lifecycle events are logged.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// The configured level, if it names one.
    pub fn tracing_level(&self) -> Option<tracing::Level> {
        self.level.parse().ok()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

// =============================================================================
// Files
// =============================================================================

/// A YAML file managed by the file store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    /// Where the file lives.
    pub path: PathBuf,

    /// File copied into place when `path` does not exist yet.
    #[serde(default)]
    pub defaults: Option<PathBuf>,
}
