/*
 * This file is part of Hypersense.
 *
 * Copyright (C) 2025 Hypersense contributors
 *
 * Hypersense is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Hypersense is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Hypersense. If not, see <https://www.gnu.org/licenses/>.
 */

//! Daemon configuration
//!
//! Loaded from `~/.config/hypersense/config.json`. Every field is optional in
//! the file; a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hs_core::constants::{paths, polling};
use hs_error::{HypersenseError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable holding the log level
pub const LOG_ENV: &str = "HYPERSENSE_LOG";

/// Level used when neither the config nor the environment sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn default_poll_interval_ms() -> u64 {
    polling::DEFAULT_INTERVAL_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Delay between hardware updates
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Sensor settings store; defaults to `~/.config/hypersense/settings.json`
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    /// Overrides `HYPERSENSE_LOG` when set
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settings_path: None,
            log_level: None,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    paths::default_config_path()
}

impl DaemonConfig {
    /// Load and validate the config at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).map_err(|source| HypersenseError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, or defaults if there is no config dir
    pub fn load_default() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(polling::MIN_INTERVAL_MS..=polling::MAX_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(HypersenseError::invalid_config(
                "poll_interval_ms",
                format!(
                    "{} is outside {}..={}",
                    self.poll_interval_ms,
                    polling::MIN_INTERVAL_MS,
                    polling::MAX_INTERVAL_MS
                ),
            ));
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(HypersenseError::invalid_config(
                    "log_level",
                    format!("'{}' is not one of {}", level, LOG_LEVELS.join(", ")),
                ));
            }
        }

        if let Some(path) = &self.settings_path {
            if path.as_os_str().is_empty() {
                return Err(HypersenseError::invalid_config(
                    "settings_path",
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Effective settings location
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_path.clone().or_else(paths::default_settings_path)
    }

    /// Effective log filter: config, then `env_level`, then `info`
    pub fn log_level(&self, env_level: Option<String>) -> String {
        self.log_level
            .clone()
            .or(env_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| HypersenseError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| HypersenseError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = DaemonConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "poll_interval_ms": 250 }"#).unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "poll_interval": 250 }"#).unwrap();

        assert!(matches!(DaemonConfig::load(&path), Err(HypersenseError::JsonParse(_))));
    }

    #[test]
    fn test_interval_bounds() {
        for (ms, ok) in [(99, false), (100, true), (60_000, true), (60_001, false)] {
            let config = DaemonConfig { poll_interval_ms: ms, ..Default::default() };
            assert_eq!(config.validate().is_ok(), ok, "interval {}", ms);
        }
    }

    #[test]
    fn test_invalid_log_level() {
        let config = DaemonConfig { log_level: Some("verbose".to_string()), ..Default::default() };
        match config.validate() {
            Err(HypersenseError::InvalidConfig { field, .. }) => assert_eq!(field, "log_level"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_log_level_precedence() {
        let mut config = DaemonConfig::default();
        assert_eq!(config.log_level(None), "info");
        assert_eq!(config.log_level(Some("debug".to_string())), "debug");

        config.log_level = Some("warn".to_string());
        assert_eq!(config.log_level(Some("debug".to_string())), "warn");
    }

    #[test]
    fn test_explicit_settings_path() {
        let config = DaemonConfig {
            settings_path: Some(PathBuf::from("/tmp/sensors.json")),
            ..Default::default()
        };
        assert_eq!(config.settings_path(), Some(PathBuf::from("/tmp/sensors.json")));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = DaemonConfig {
            poll_interval_ms: 500,
            settings_path: None,
            log_level: Some("debug".to_string()),
        };

        config.save(&path).unwrap();
        assert_eq!(DaemonConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_values_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "poll_interval_ms": 5 }"#).unwrap();

        assert!(matches!(
            DaemonConfig::load(&path),
            Err(HypersenseError::InvalidConfig { .. })
        ));
    }
}
