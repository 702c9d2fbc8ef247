pub mod activity;
pub mod config;
pub mod errors;
pub mod logging;
pub mod paths;

pub use activity::ActivityLog;
pub use config::{ConfigStore, LauncherConfig, Theme};
pub use errors::{ConfigError, Result};
pub use paths::AppDirs;
