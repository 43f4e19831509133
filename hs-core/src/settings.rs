//! Sensor Settings
//!
//! Key/value string store for user overrides (sensor display names, parameter
//! values). Keys are identifier paths such as `/amdcpu/0/load/1/name`.
//!
//! The file-backed store persists as JSON in ~/.config/hypersense/settings.json

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{HypersenseError, Result};

/// Key/value store used for persisted sensor overrides.
///
/// Implementations are shared between sensors and must be usable through `&self`.
/// A store is assumed to always be available: failures to persist are logged by
/// the implementation, never reported to the sensor.
pub trait Settings: Send + Sync {
    /// Value stored under `key`, or `default` if there is none
    fn get(&self, key: &str, default: &str) -> String;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str);

    /// Whether a value is stored under `key`
    fn contains(&self, key: &str) -> bool;

    /// Drop the value stored under `key`, if any
    fn remove(&self, key: &str);
}

// ============================================================================
// In-memory store
// ============================================================================

/// Settings kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl Settings for MemorySettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Settings persisted to a JSON object on disk.
///
/// The whole map is loaded once at open and cached; every mutation rewrites the
/// file atomically (temp file, then rename).
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonSettings {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| HypersenseError::FileRead {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("No settings file at {:?}, starting empty", path);
            BTreeMap::new()
        };

        debug!("Loaded {} settings from {:?}", values.len(), path);
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        let path = crate::constants::paths::default_settings_path()
            .ok_or_else(|| HypersenseError::config("Could not determine config directory"))?;
        Self::open(path)
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = write_atomic(&self.path, values) {
            warn!("Failed to persist settings to {:?}: {}", self.path, e);
        }
    }
}

fn write_atomic(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| HypersenseError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(values)?;

    // Write to temp file then rename so a crash never leaves a truncated file
    let temp_path = path.with_extension("json.tmp");
    let write_err = |source| HypersenseError::FileWrite {
        path: temp_path.clone(),
        source,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| HypersenseError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

impl Settings for JsonSettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.write();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}
