//! Persisted application settings (JSON)

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{backup::DEFAULT_RETENTION, config};
use crate::store::{ProfileStore, validate_install_directory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Game installation root, empty until configured
    #[serde(default)]
    pub install_path: String,

    /// Account directory name, empty until selected
    #[serde(default)]
    pub selected_account: String,

    /// Manifest backups kept per account
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_backup_count() -> usize {
    DEFAULT_RETENTION
}

fn default_log_level() -> String {
    config::DEFAULT_LOG_LEVEL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            install_path: String::new(),
            selected_account: String::new(),
            backup_count: default_backup_count(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the standard location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let mut config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;

        if config.backup_count == 0 {
            warn!(default = DEFAULT_RETENTION, "backup_count of 0 in config, using default");
            config.backup_count = DEFAULT_RETENTION;
        }

        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.install_path.is_empty() {
            bail!("install path is not set");
        }
        validate_install_directory(Path::new(&self.install_path))?;

        if self.backup_count == 0 {
            bail!("backup_count must be at least 1");
        }
        Ok(())
    }

    pub fn store(&self) -> ProfileStore {
        ProfileStore::new(&self.install_path, self.backup_count)
    }
}
