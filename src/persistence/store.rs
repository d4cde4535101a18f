//! Flat string key-value configuration store
//!
//! Values are persisted as a single JSON object. A missing, empty or corrupt
//! document is replaced with an empty one on open, and the replacement is
//! written back immediately.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Durable string -> string storage
pub trait ConfigStore {
    fn read(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str);
}

/// Errors while touching the backing document
#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Malformed(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "config I/O failed: {}", e),
            PersistenceError::Malformed(e) => write!(f, "config document is malformed: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Malformed(e) => Some(e),
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Malformed(e)
    }
}

/// In-memory store (tests, or when no disk is available)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Store backed by a JSON document on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open (or create) the document at `path`. Never fails: unreadable
    /// content falls back to an empty document that is written straight back.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (values, rewrite) = match Self::load(&path) {
            Ok(Some(values)) => {
                log::info!("Loaded {} config values from {}", values.len(), path.display());
                (values, false)
            }
            Ok(None) => {
                log::info!("No config at {}, creating it", path.display());
                (BTreeMap::new(), true)
            }
            Err(e) => {
                log::warn!("{} ({}), resetting to defaults", e, path.display());
                (BTreeMap::new(), true)
            }
        };

        let store = Self { path, values };
        if rewrite {
            if let Err(e) = store.flush() {
                log::warn!("Could not write config {}: {}", store.path.display(), e);
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; `Ok(None)` when the file does not exist
    fn load(path: &Path) -> Result<Option<BTreeMap<String, String>>, PersistenceError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let values = serde_json::from_str(&text)?;
        Ok(Some(values))
    }

    /// Write the whole document (tmp file, then rename)
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&self.values)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            log::warn!("Failed to save '{}': {}", key, e);
        }
    }
}

/// Booleans are persisted as "True"/"False"
pub fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Read a boolean, accepting any casing of true/false
pub fn read_bool(store: &dyn ConfigStore, key: &str, default: bool) -> bool {
    match store.read(key).as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        Some(v) => {
            log::warn!("Config '{}' has non-boolean value '{}', using {}", key, v, default);
            default
        }
        None => default,
    }
}

/// Read and parse a value, falling back to `default` when absent or invalid
pub fn read_parsed<T: FromStr>(store: &dyn ConfigStore, key: &str, default: T) -> T {
    match store.read(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Config '{}' has unparsable value '{}'", key, raw);
            default
        }),
        None => default,
    }
}
