use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use tracing::{debug, error, info, instrument};

use crate::errors::{ConfigError, Result};

const SUBDIRECTORIES: [&str; 4] = ["versions", "assets", "runtime", "logs"];

/// Launcher data directory layout
///
/// ```text
/// <data dir>/
/// ├── config.toml
/// ├── auth.json
/// ├── versions/
/// ├── assets/
/// ├── runtime/
/// └── logs/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Resolve the per-user data directory for this platform
    pub fn discover() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "quantumcraft", "QuantumCraft").ok_or_else(|| {
            error!("Failed to determine project directories");
            ConfigError::ProjectDirectoriesUnavailable
        })?;

        Ok(Self::at(proj_dirs.data_dir()))
    }

    /// Use an explicit data directory
    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the directory tree if it is missing
    #[instrument(skip(self), fields(root = %self.root.display()), level = "debug")]
    pub async fn ensure(&self) -> Result<()> {
        for dir in std::iter::once(self.root.clone())
            .chain(SUBDIRECTORIES.iter().map(|name| self.root.join(name)))
        {
            if tokio::fs::metadata(&dir).await.is_ok() {
                continue;
            }

            info!("Directory doesn't exist, creating: {}", dir.display());
            tokio::fs::create_dir_all(&dir)
                .await
                .context("Failed to create launcher directory")
                .map_err(|e| {
                    error!("Failed to create directory {}: {}", dir.display(), e);
                    ConfigError::DirectoryCreationFailed {
                        path: dir.clone(),
                        source: e,
                    }
                })?;
        }

        debug!("Data directory ready");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn assets(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn runtime(&self) -> PathBuf {
        self.root.join("runtime")
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn session_file(&self) -> PathBuf {
        self.root.join("auth.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ensure_creates_layout() {
        let temp_dir = tempdir().unwrap();
        let dirs = AppDirs::at(temp_dir.path().join("QuantumCraft"));

        dirs.ensure().await.unwrap();

        assert!(dirs.root().is_dir());
        assert!(dirs.versions().is_dir());
        assert!(dirs.assets().is_dir());
        assert!(dirs.runtime().is_dir());
        assert!(dirs.logs().is_dir());
        assert!(!dirs.config_file().exists());
        assert!(!dirs.session_file().exists());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let dirs = AppDirs::at(temp_dir.path());
        std::fs::write(dirs.versions().with_extension("keep"), "x").unwrap();

        dirs.ensure().await.unwrap();
        dirs.ensure().await.unwrap();

        assert!(dirs.versions().is_dir());
        assert!(temp_dir.path().join("versions.keep").exists());
    }

    #[test]
    fn test_discover() {
        let result = AppDirs::discover();
        assert!(result.is_ok(), "Failed to get project directories");
    }
}
