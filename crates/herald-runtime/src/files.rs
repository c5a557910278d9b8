//! YAML configuration files owned by a bot.
//!
//! A [`ConfigFile`] is a YAML document on disk with an optional defaults file
//! that seeds it the first time. A [`FileManager`] keeps them under string
//! keys so handlers can reach their settings by name.
//!
//! ```rust,ignore
//! let settings = bot.files().require("settings")?;
//! let greeting: Option<String> = settings.get("messages.greeting")?;
//! settings.set("messages.greeting", "hi there")?;
//! settings.save()?;
//! ```
//!
//! Keys are dotted paths into nested mappings (`a.b.c`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::config::FileEntry;
use crate::error::{FileError, FileResult};

// ============================================================================
// ConfigFile
// ============================================================================

/// A YAML file with an in-memory copy of its contents.
pub struct ConfigFile {
    path: PathBuf,
    defaults: Option<PathBuf>,
    data: RwLock<Value>,
}

impl ConfigFile {
    /// Describes a file; nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>, defaults: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defaults,
            data: RwLock::new(Value::Mapping(Mapping::new())),
        }
    }

    /// Opens a configured entry: create it if missing, then load it.
    pub fn open(entry: &FileEntry) -> FileResult<Self> {
        let file = Self::new(&entry.path, entry.defaults.clone());
        file.create_if_missing()?;
        file.load()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> Option<&Path> {
        self.defaults.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Creates the file, copying the defaults file when there is one.
    ///
    /// Overwrites an existing file.
    pub fn create(&self) -> FileResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FileError::io(parent, e))?;
        }

        match &self.defaults {
            Some(defaults) => {
                fs::copy(defaults, &self.path).map_err(|e| FileError::io(defaults, e))?;
                debug!(path = %self.path.display(), defaults = %defaults.display(), "Created file from defaults");
            }
            None => {
                fs::write(&self.path, "").map_err(|e| FileError::io(&self.path, e))?;
                debug!(path = %self.path.display(), "Created empty file");
            }
        }
        Ok(())
    }

    /// Creates the file unless it already exists. Returns `true` if created.
    pub fn create_if_missing(&self) -> FileResult<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.create()?;
        Ok(true)
    }

    /// Replaces the in-memory contents with what is on disk.
    pub fn load(&self) -> FileResult<()> {
        let text = fs::read_to_string(&self.path).map_err(|e| FileError::io(&self.path, e))?;
        let value = if text.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str(&text).map_err(|e| FileError::yaml(&self.path, e))?
        };

        if !value.is_mapping() {
            return Err(FileError::NotAMapping {
                path: self.path.clone(),
                key: String::new(),
            });
        }

        *self.data.write() = value;
        Ok(())
    }

    /// Writes the in-memory contents to disk.
    pub fn save(&self) -> FileResult<()> {
        let text = {
            let data = self.data.read();
            serde_yaml::to_string(&*data).map_err(|e| FileError::yaml(&self.path, e))?
        };
        fs::write(&self.path, text).map_err(|e| FileError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Saved file");
        Ok(())
    }

    /// Reads the value at a dotted key. `Ok(None)` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> FileResult<Option<T>> {
        let data = self.data.read();

        let mut current = &*data;
        for part in key.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        serde_yaml::from_value(current.clone())
            .map(Some)
            .map_err(|e| FileError::yaml(&self.path, e))
    }

    /// Sets the value at a dotted key, creating intermediate mappings.
    ///
    /// Only the in-memory copy changes; call [`save`](Self::save) to persist.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> FileResult<()> {
        let value = serde_yaml::to_value(value).map_err(|e| FileError::yaml(&self.path, e))?;
        let mut data = self.data.write();

        let mut parts = key.split('.').peekable();
        let mut current = &mut *data;
        let mut walked = String::new();

        while let Some(part) = parts.next() {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(part);

            let Value::Mapping(map) = current else {
                return Err(FileError::NotAMapping {
                    path: self.path.clone(),
                    key: walked,
                });
            };

            let slot = Value::String(part.to_string());
            if parts.peek().is_none() {
                map.insert(slot, value);
                return Ok(());
            }

            current = map
                .entry(slot)
                .or_insert_with(|| Value::Mapping(Mapping::new()));
        }

        Ok(())
    }

    /// Removes the value at a dotted key. Returns `true` if it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write();
        let (parents, last) = match key.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, key),
        };

        let mut current = &mut *data;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                match current.get_mut(part) {
                    Some(next) => current = next,
                    None => return false,
                }
            }
        }

        match current {
            Value::Mapping(map) => map.remove(last).is_some(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFile")
            .field("path", &self.path)
            .field("defaults", &self.defaults)
            .finish()
    }
}

// ============================================================================
// FileManager
// ============================================================================

/// Keyed collection of [`ConfigFile`]s.
#[derive(Debug, Default)]
pub struct FileManager {
    files: RwLock<HashMap<String, Arc<ConfigFile>>>,
}

impl FileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens every configured entry (creating missing files) and adds it.
    pub fn open_all(&self, entries: &HashMap<String, FileEntry>) -> FileResult<()> {
        for (key, entry) in entries {
            let file = ConfigFile::open(entry)?;
            info!(key = %key, path = %entry.path.display(), "Opened file");
            self.add(key.clone(), Arc::new(file));
        }
        Ok(())
    }

    /// Adds a file under `key`, returning the file it replaced.
    pub fn add(&self, key: impl Into<String>, file: Arc<ConfigFile>) -> Option<Arc<ConfigFile>> {
        self.files.write().insert(key.into(), file)
    }

    pub fn get(&self, key: &str) -> Option<Arc<ConfigFile>> {
        self.files.read().get(key).cloned()
    }

    /// Like [`get`](Self::get), but an unknown key is an error.
    pub fn require(&self, key: &str) -> FileResult<Arc<ConfigFile>> {
        self.get(key)
            .ok_or_else(|| FileError::UnknownKey(key.to_string()))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<ConfigFile>> {
        self.files.write().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.files.read().contains_key(key)
    }

    /// Returns `true` if some managed file lives at `path`.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.files.read().values().any(|f| f.path() == path)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.files.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}
