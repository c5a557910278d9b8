//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files (`herald.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`herald.yaml`, `herald.yml`, etc.)
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`herald.{profile}.toml`)
//! 3. Main config file (`herald.toml`)
//! 4. Environment variables (`HERALD_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `HERALD_` prefix with `__` between sections:
//!
//! - `HERALD_BOT__PREFIX=?` → `bot.prefix = "?"`
//! - `HERALD_DISPATCH__WORKERS=8` → `dispatch.workers = 8`
//! - `HERALD_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::HeraldConfig;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "HERALD_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "HERALD_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `HERALD_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("herald"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, above every other source.
    ///
    /// Every key of `config` is overridden, including those left at their
    /// defaults. Use [`set`](Self::set) to override a single key.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Overrides one dotted key (`"dispatch.workers"`), above every other source.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<HeraldConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: HeraldConfig = figment.extract()?;

        debug!(
            profile = %profile,
            prefix = %config.bot.prefix,
            workers = config.dispatch.workers,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()));

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment)?;
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        // Programmatic overrides win over files and environment.
        let overrides = std::mem::take(&mut self.figment);
        Ok(figment.merge(overrides))
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("herald"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Walks the search paths for the first main config file, merging its
    /// profile variant (`herald.production.toml`) underneath it.
    fn load_config_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        for dir in self.resolve_search_paths() {
            for name in config_file_names() {
                let Some((stem, ext)) = name.rsplit_once('.') else {
                    continue;
                };

                let profiled = dir.join(format!("{stem}.{}.{ext}", self.profile));
                if profiled.exists() {
                    debug!(path = %profiled.display(), "Loading profile-specific config");
                    figment = Self::merge_config_file(figment, &profiled)?;
                }

                let base = dir.join(name);
                if base.exists() {
                    info!(path = %base.display(), "Loading configuration file");
                    return Self::merge_config_file(figment, &base);
                }
            }
        }

        warn!("No configuration file found, using defaults");
        Ok(figment)
    }
}

/// Main config file names for the enabled formats, in lookup order.
#[allow(unused_mut)]
fn config_file_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend(["herald.toml", "config.toml"]);
    #[cfg(feature = "yaml-config")]
    names.extend(["herald.yaml", "herald.yml", "config.yaml", "config.yml"]);
    names
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file plus environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use herald_framework::FanOutOrder;

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config, HeraldConfig::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/definitely/not/here/herald.toml")
            .without_env()
            .load();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.ini");
        std::fs::write(&path, "prefix = ?").unwrap();

        let result = ConfigLoader::new().file(&path).without_env().load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_base_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("herald.production.toml"),
            "[bot]\nprefix = \"$\"\n[dispatch]\nworkers = 16\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("herald.toml"), "[bot]\nprefix = \"?\"\n").unwrap();

        let config = ConfigLoader::new()
            .profile("prod")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.bot.prefix, "?");
        assert_eq!(config.dispatch.workers, 16);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_env_merge_precedence() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "herald.toml",
                "[bot]\nprefix = \"?\"\n[dispatch]\nworkers = 2\nfan_out = \"priority\"\n",
            )?;
            jail.set_env("HERALD_DISPATCH__WORKERS", 5);
            jail.set_env("HERALD_DISPATCH__QUEUE_CAPACITY", 64);

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .set("dispatch.workers", 3)
                .load()
                .map_err(|e| e.to_string())?;

            // only the environment sets the capacity
            assert_eq!(config.dispatch.queue_capacity, 64);
            // override beats env, env beats file
            assert_eq!(config.dispatch.workers, 3);
            assert_eq!(config.dispatch.fan_out, FanOutOrder::Priority);
            assert_eq!(config.bot.prefix, "?");

            // a merged config replaces every key, env included
            let mut merged = HeraldConfig::default();
            merged.dispatch.workers = 7;
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(merged)
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.dispatch.workers, 7);
            assert_eq!(config.dispatch.queue_capacity, 1024);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_env_beats_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("herald.toml", "[dispatch]\nworkers = 2\n")?;
            jail.set_env("HERALD_DISPATCH__WORKERS", 5);
            jail.set_env("HERALD_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.dispatch.workers, 5);
            assert_eq!(config.logging.level, "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.dispatch.workers, 2);
            Ok(())
        });
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
        assert_eq!(Profile::Custom("staging".into()).to_string(), "staging");
    }
}
