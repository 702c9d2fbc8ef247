use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use qc_core::{ActivityLog, LauncherConfig};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::errors::{LaunchError, Result};
use crate::events::LaunchEvent;
use crate::handle::LaunchHandle;
use crate::launcher::GameLauncher;
use crate::request::LaunchRequest;

/// Environment variable carrying the game access token
pub const ACCESS_TOKEN_ENV: &str = "QC_ACCESS_TOKEN";
/// Environment variable carrying the Xbox user hash
pub const USER_HASH_ENV: &str = "QC_USER_HASH";

/// Runs an external launcher executable for each request
///
/// The executable receives the request as `--flag value` arguments and the
/// access token through [`ACCESS_TOKEN_ENV`], so the token never shows up
/// in process listings.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
    leading_args: Vec<String>,
    activity: Option<ActivityLog>,
}

impl CommandLauncher {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            leading_args: Vec::new(),
            activity: None,
        }
    }

    /// Launcher configured by `launcher_command`
    pub fn from_config(config: &LauncherConfig) -> Result<Self> {
        config
            .launcher_command
            .as_ref()
            .map(Self::new)
            .ok_or(LaunchError::LauncherNotConfigured)
    }

    /// Arguments placed before the request arguments
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn build_command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd.args(request_args(request));

        cmd.env(ACCESS_TOKEN_ENV, &request.access_token);
        cmd.env(USER_HASH_ENV, &request.user_hash);

        cmd.current_dir(&request.game_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

fn request_args(request: &LaunchRequest) -> Vec<String> {
    let mut args = vec![
        "--version".to_string(),
        request.version.clone(),
        "--username".to_string(),
        request.username.clone(),
        "--uuid".to_string(),
        request.uuid.clone(),
        "--game-dir".to_string(),
        request.game_dir.display().to_string(),
        "--min-memory".to_string(),
        format!("{}M", request.min_memory_mb),
        "--max-memory".to_string(),
        format!("{}M", request.max_memory_mb),
        "--width".to_string(),
        request.window.width.to_string(),
        "--height".to_string(),
        request.window.height.to_string(),
    ];

    if let Some(java) = &request.java_path {
        args.push("--java-path".to_string());
        args.push(java.display().to_string());
    }

    args
}

/// Forward every line of `reader`; keep reading after the handle is gone so
/// the child never blocks on a full pipe.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<LaunchEvent>, to_event: fn(String) -> LaunchEvent)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let _ = tx.send(to_event(line)).await;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read launcher output: {}", e);
                break;
            }
        }
    }
}

#[async_trait]
impl GameLauncher for CommandLauncher {
    #[instrument(skip(self, request), fields(version = %request.version))]
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle> {
        info!(
            program = %self.program.display(),
            player = %request.username,
            memory = request.max_memory_mb,
            "launching game"
        );

        let mut child = self
            .build_command(request)
            .spawn()
            .map_err(|source| LaunchError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        let (tx, handle) = LaunchHandle::channel();
        let handle = match &self.activity {
            Some(activity) => {
                activity
                    .append(&format!(
                        "Launching {} as {} ({}) with {}M",
                        request.version, request.username, request.uuid, request.max_memory_mb
                    ))
                    .await;
                handle.with_activity_log(activity.clone())
            }
            None => handle,
        };

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, tx.clone(), LaunchEvent::from_stdout_line)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, tx.clone(), LaunchEvent::Debug)));

        tokio::spawn(async move {
            for reader in [stdout, stderr].into_iter().flatten() {
                let _ = reader.await;
            }

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("Failed to wait for launcher process: {}", e);
                    None
                }
            };
            info!(?code, "game process exited");
            let _ = tx.send(LaunchEvent::Exited { code }).await;
        });

        Ok(handle)
    }
}
