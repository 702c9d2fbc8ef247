use async_trait::async_trait;

use crate::errors::Result;
use crate::handle::LaunchHandle;
use crate::request::LaunchRequest;

/// Installs (if needed) and starts one game version
///
/// Returns as soon as the game is running; progress and the exit status
/// arrive through the handle.
#[async_trait]
pub trait GameLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle>;
}
