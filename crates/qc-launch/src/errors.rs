use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("The stored session has expired - sign in again before launching")]
    SessionExpired,

    #[error("No game version selected")]
    MissingVersion,

    #[error("No launcher executable configured - set `launcher_command` in config.toml")]
    LauncherNotConfigured,

    #[error("Failed to start '{program}': {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Game process output ended without an exit status")]
    ProcessLost,
}

pub type Result<T> = std::result::Result<T, LaunchError>;
