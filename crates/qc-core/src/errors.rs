use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Project directories are unavailable - this usually indicates an unsupported OS or missing home directory"
    )]
    ProjectDirectoriesUnavailable,

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileReadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    ConfigFileWriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParsingFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to serialize config: {source}")]
    ConfigSerializationFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to install log subscriber: {source}")]
    LoggingInitFailed {
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
