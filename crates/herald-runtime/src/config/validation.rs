//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, FileEntry, HeraldConfig, LogFormat, LogOutput, LoggingConfig};
use std::collections::HashMap;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_prefix(&config.bot.prefix)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_logging_config(&config.logging)?;
    validate_files(&config.files)?;
    Ok(())
}

fn validate_prefix(prefix: &str) -> ConfigResult<()> {
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }
    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.workers == 0 {
        return Err(ConfigError::validation(
            "dispatch.workers must be greater than 0",
        ));
    }

    if dispatch.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "dispatch.queue_capacity must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_level(level: &str, what: &str) -> ConfigResult<()> {
    if !VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(ConfigError::validation(format!(
            "Invalid {what}: {level}. Valid values are: {VALID_LOG_LEVELS:?}"
        )));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    validate_level(&logging.level, "log level")?;

    for (module, level) in &logging.filters {
        validate_level(level, &format!("level for filter '{module}'"))?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if cfg!(not(feature = "json-log")) && logging.format == LogFormat::Json {
        return Err(ConfigError::validation(
            "JSON log format requires the `json-log` feature",
        ));
    }

    Ok(())
}

fn validate_files(files: &HashMap<String, FileEntry>) -> ConfigResult<()> {
    for (key, entry) in files {
        if key.trim().is_empty() {
            return Err(ConfigError::validation("File keys cannot be empty"));
        }

        if entry.path.as_os_str().is_empty() {
            return Err(ConfigError::missing_field(format!("files.{key}.path")));
        }
    }
    Ok(())
}
