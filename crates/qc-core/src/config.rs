use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::errors::{ConfigError, Result};

pub const DEFAULT_MEMORY_MB: u64 = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// User preferences persisted in `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Maximum game heap in megabytes
    pub memory_mb: u64,
    /// When the game was last started
    pub last_played: Option<DateTime<Utc>>,
    /// Version started last
    pub last_version: Option<String>,
    pub theme: Theme,
    /// Java executable, auto-detected by the game launcher when unset
    pub java_path: Option<PathBuf>,
    /// External executable that installs and starts the game
    pub launcher_command: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            memory_mb: DEFAULT_MEMORY_MB,
            last_played: None,
            last_version: None,
            theme: Theme::default(),
            java_path: None,
            launcher_command: None,
        }
    }
}

/// TOML-backed store for [`LauncherConfig`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, writing the defaults on first run
    #[instrument(skip(self), level = "debug")]
    pub async fn load_or_init(&self) -> Result<LauncherConfig> {
        if tokio::fs::metadata(&self.path).await.is_err() {
            info!(
                "Config file doesn't exist, writing defaults: {}",
                self.path.display()
            );
            let config = LauncherConfig::default();
            self.save(&config).await?;
            return Ok(config);
        }

        self.load().await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn load(&self) -> Result<LauncherConfig> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .context("Failed to read config.toml file")
            .map_err(|e| {
                error!("Failed to read config file {}: {}", self.path.display(), e);
                ConfigError::ConfigFileReadFailed {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

        let config: LauncherConfig = toml::from_str(&content)
            .context("Failed to parse config.toml file")
            .map_err(|e| {
                error!("Failed to parse config file {}: {}", self.path.display(), e);
                ConfigError::ConfigParsingFailed {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

        debug!("Loaded config from {}", self.path.display());
        Ok(config)
    }

    /// Write the config through a temporary file renamed into place
    #[instrument(skip(self, config), level = "debug")]
    pub async fn save(&self, config: &LauncherConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")
                .map_err(|e| ConfigError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let toml = toml::to_string_pretty(config)
            .context("Failed to serialize config to TOML")
            .map_err(|e| {
                error!("Failed to serialize config: {}", e);
                ConfigError::ConfigSerializationFailed { source: e }
            })?;

        let temp_path = self.path.with_extension("toml.tmp");
        let write = async {
            tokio::fs::write(&temp_path, toml)
                .await
                .context("Failed to write temporary config file")?;
            tokio::fs::rename(&temp_path, &self.path)
                .await
                .context("Failed to replace config.toml file")
        };

        write.await.map_err(|e| {
            error!("Failed to write config file {}: {}", self.path.display(), e);
            ConfigError::ConfigFileWriteFailed {
                path: self.path.clone(),
                source: e,
            }
        })?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Load, modify and save in one step
    pub async fn update<F>(&self, change: F) -> Result<LauncherConfig>
    where
        F: FnOnce(&mut LauncherConfig),
    {
        let mut config = self.load_or_init().await?;
        change(&mut config);
        self.save(&config).await?;
        Ok(config)
    }

    /// Remember the version that was just launched
    pub async fn record_played(&self, version: &str) -> Result<LauncherConfig> {
        self.update(|config| {
            config.last_played = Some(Utc::now());
            config.last_version = Some(version.to_string());
        })
        .await
    }
}
