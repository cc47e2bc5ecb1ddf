//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes where data is stored, where seed documents come from,
//! and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/cys/config.json`. The environment
//! variables `CYS_DATA_DIR`, `CYS_SEED_URL` and `CYS_SEED_DIR` override the
//! file for a single run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::seed::{DirSeedSource, HttpSeedSource, NoSeeds, Seeds};

/// Application name used for config/data directory paths
const APP_NAME: &str = "cys";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_DATA_DIR: &str = "CYS_DATA_DIR";
pub const ENV_SEED_URL: &str = "CYS_SEED_URL";
pub const ENV_SEED_DIR: &str = "CYS_SEED_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Where the key-value files live; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
    /// Base URL seed documents are fetched from, e.g. `http://localhost:5173`
    pub seed_base_url: Option<String>,
    /// Site root on disk to read seed documents from
    pub seed_dir: Option<PathBuf>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// normal runs)
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(dir) = non_empty(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = non_empty(ENV_SEED_URL) {
            self.seed_base_url = Some(url);
        }
        if let Some(dir) = non_empty(ENV_SEED_DIR) {
            self.seed_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Seed source for this configuration. A base URL takes precedence
    /// over a seed directory; with neither, only built-in fallbacks apply.
    pub fn seed_source(&self) -> Result<Seeds> {
        if let Some(ref url) = self.seed_base_url {
            return Ok(Seeds::Http(HttpSeedSource::new(url)?));
        }
        if let Some(ref dir) = self.seed_dir {
            return Ok(Seeds::Dir(DirSeedSource::new(dir.clone())));
        }
        Ok(Seeds::None(NoSeeds))
    }
}
