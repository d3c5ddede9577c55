//! Settings file handling
//!
//! Settings live in a single TOML file, `padkeys/keymap.toml` under the
//! user's config directory, or wherever `PADKEYS_CONFIG` points. A missing
//! file is created with the defaults on first start.

use crate::driver::scheduler::SchedulerSettings;
use crate::mapping::error::MappingError;
use crate::mapping::keymap::{Keymap, KeymapConfig};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{create_dir_all, read_to_string, try_exists, write};
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "PADKEYS_CONFIG";
const CONFIG_DIR: &str = "padkeys";
const CONFIG_FILE: &str = "keymap.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Time between frames while a controller is connected
    pub frame_interval_ms: u64,
    /// Time between connection polls while no controller is connected
    pub reconnect_poll_ms: u64,
    pub keymap: KeymapConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let scheduler = SchedulerSettings::default();
        Self {
            frame_interval_ms: scheduler.frame_interval_ms,
            reconnect_poll_ms: scheduler.reconnect_poll_ms,
            keymap: KeymapConfig::default_config(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.frame_interval_ms == 0 {
            return Err(MappingError::ConfigError(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_poll_ms == 0 {
            return Err(MappingError::ConfigError(
                "reconnect_poll_ms must be greater than zero".to_string(),
            ));
        }
        self.keymap.validate()
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            frame_interval_ms: self.frame_interval_ms,
            reconnect_poll_ms: self.reconnect_poll_ms,
        }
    }

    pub fn build_keymap(&self) -> Result<Keymap, MappingError> {
        Keymap::from_config(&self.keymap)
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        debug!("Using config path from {}: {}", CONFIG_ENV, path);
        return PathBuf::from(path);
    }

    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

/// Writes the default settings to `path` unless a file already exists there
pub async fn ensure_default_config(path: &Path) -> Result<()> {
    if try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
    {
        return Ok(());
    }

    info!("Creating default configuration at {}", path.display());
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .await
            .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
    }

    let content = toml::to_string_pretty(&Settings::default())
        .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
    write(path, content)
        .await
        .map_err(|e| eyre!("Failed to write config file: {}", e))?;
    Ok(())
}

pub async fn load_settings(path: &Path) -> Result<Settings> {
    let content = read_to_string(path)
        .await
        .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    let settings: Settings = toml::from_str(&content)
        .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
    settings
        .validate()
        .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))?;

    info!("Loaded settings from {}", path.display());
    Ok(settings)
}
