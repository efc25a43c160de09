//! Configuration loading with multi-layer merge

use super::error::ConfigError;
use super::sections::{LogLevel, LoggingConfig, SearchConfig, StorageConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "memory-context";
const PROJECT_CONFIG: &str = ".memory-context/config.toml";

/// Top-level memory-context configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl MemoryConfig {
    /// Load configuration from the standard hierarchy
    ///
    /// Load order (later overrides earlier):
    /// 1. Built-in defaults
    /// 2. ~/.config/memory-context/config.toml
    /// 3. .memory-context/config.toml (project)
    /// 4. `explicit`, when given (must exist)
    pub fn load(project_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                let user_config = Self::load_file(&user_config_path)
                    .with_context(|| format!("loading {}", user_config_path.display()))?;
                config.merge(user_config);
            }
        }

        let project_config_path = project_dir
            .map(|p| p.join(PROJECT_CONFIG))
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG));

        if project_config_path.exists() {
            let project_config = Self::load_file(&project_config_path)
                .with_context(|| format!("loading {}", project_config_path.display()))?;
            config.merge(project_config);
        }

        if let Some(path) = explicit {
            let explicit_config =
                Self::load_file(path).with_context(|| format!("loading {}", path.display()))?;
            config.merge(explicit_config);
        }

        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Get the user config path (~/.config/memory-context/config.toml)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.storage.atomic_writes.is_some() {
            self.storage.atomic_writes = other.storage.atomic_writes;
        }

        if other.logging.level.is_some() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file.is_some() {
            self.logging.file = other.logging.file;
        }

        if other.search.default_limit.is_some() {
            self.search.default_limit = other.search.default_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.default_limit == Some(0) {
            return Err(ConfigError::ZeroSearchLimit);
        }
        Ok(())
    }

    /// Resolved storage base directory
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(raw) => expand_path(raw),
            None => Ok(default_data_dir()),
        }
    }

    /// Resolved log file, if one is configured
    pub fn log_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        self.logging.file.as_deref().map(expand_path).transpose()
    }

    pub fn log_level(&self) -> LogLevel {
        self.logging.level.unwrap_or(LogLevel::Info)
    }
}

/// Platform data directory, falling back to a project-local one
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".memory-context/data"))
}

fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ConfigError::Expand {
            path: raw.to_string(),
            message: e.to_string(),
        })
}
