//! Runtime error types.

use std::path::{Path, PathBuf};

use herald_core::{GatewayError, SinkError};
use herald_framework::BindError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Gateway error.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The dispatch queue refused an event.
    #[error("Dispatch queue error: {0}")]
    Sink(#[from] SinkError),

    /// A listener could not be built.
    #[error("Listener error: {0}")]
    Bind(#[from] BindError),

    /// A managed file could not be opened.
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// `start` was called on a running bot.
    #[error("Bot is already running")]
    AlreadyRunning,

    /// `stop` was called on a bot that is not running.
    #[error("Bot is not running")]
    NotRunning,
}

/// Errors from managed YAML files.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value on the way to a key is not a mapping.
    #[error("{} is not a mapping at '{key}'", path.display())]
    NotAMapping { path: PathBuf, key: String },

    /// No file is registered under this key.
    #[error("No file registered as '{0}'")]
    UnknownKey(String),
}

impl FileError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;
