mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use qc_auth::{
    AuthClient, AuthConfig, AuthPath, FileSessionStore, SessionOrchestrator, StartState,
};
use qc_core::{ActivityLog, AppDirs, ConfigStore, LauncherConfig, Theme, logging};
use qc_launch::{CommandLauncher, GameLauncher, LaunchEvent, LaunchRequest};
use tracing::{error, warn};

use crate::terminal::TerminalSurface;

#[derive(Parser)]
#[command(author, version, about = "QuantumCraft Minecraft launcher", long_about = None)]
struct Cli {
    /// Use this data directory instead of the per-user default
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in
    Status,
    /// Sign in with a Microsoft account
    Login,
    /// Forget the stored session
    Logout,
    /// Start the game
    Launch {
        /// Minecraft version, defaults to the last one played
        version: Option<String>,
    },
    /// Show or change launcher settings
    Config {
        /// Maximum memory in megabytes
        #[arg(long, value_parser = clap::value_parser!(u64).range(512..))]
        memory: Option<u64>,

        #[arg(long)]
        theme: Option<ThemeArg>,

        /// Java executable
        #[arg(long)]
        java: Option<PathBuf>,

        /// External launcher executable
        #[arg(long)]
        launcher: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

struct Launcher {
    dirs: AppDirs,
    config: ConfigStore,
    activity: ActivityLog,
    auth: SessionOrchestrator,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dirs = match &cli.data_dir {
        Some(dir) => AppDirs::at(dir),
        None => AppDirs::discover()?,
    };
    dirs.ensure().await?;

    let _guard = logging::init(&dirs.logs(), if cli.verbose { "debug" } else { "info" })?;

    let config = ConfigStore::new(dirs.config_file());
    config.load_or_init().await?;

    let store = Arc::new(FileSessionStore::new(dirs.session_file()).await?);
    let client = AuthClient::new(AuthConfig::official_desktop())?;

    let launcher = Launcher {
        activity: ActivityLog::new(dirs.logs()),
        auth: SessionOrchestrator::new(client, store),
        config,
        dirs,
    };

    let result = match cli.command {
        Commands::Status => launcher.status().await,
        Commands::Login => launcher.login().await.map(|_| ()),
        Commands::Logout => launcher.logout().await,
        Commands::Launch { version } => launcher.launch(version).await,
        Commands::Config {
            memory,
            theme,
            java,
            launcher: program,
        } => launcher.configure(memory, theme, java, program).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

impl Launcher {
    async fn status(&self) -> anyhow::Result<()> {
        match self.auth.start_state().await {
            StartState::ColdStart => println!("Not signed in"),
            StartState::WarmStart(session) => {
                println!(
                    "Signed in as {} ({})",
                    session.profile.name,
                    session.profile.formatted_identifier()
                );
                match session.expires_at() {
                    Some(at) if !session.is_expired() => println!("Session valid until {}", at),
                    _ => println!("Session expired, it will be renewed on next login or launch"),
                }
            }
        }
        Ok(())
    }

    async fn login(&self) -> anyhow::Result<qc_auth::Session> {
        let mut surface = TerminalSurface::new();
        let signed_in = match self.auth.authenticate(&mut surface).await {
            Ok(signed_in) => signed_in,
            Err(e) => {
                self.activity.append(&format!("Login error: {}", e)).await;
                return Err(e).context("Sign-in failed");
            }
        };

        let name = &signed_in.session.profile.name;
        match signed_in.via {
            AuthPath::Stored => println!("Already signed in as {}", name),
            AuthPath::Renewed => println!("Session renewed for {}", name),
            AuthPath::Interactive => println!("Signed in as {}", name),
        }
        self.activity.append(&format!("Logged in as {}", name)).await;

        Ok(signed_in.session)
    }

    async fn logout(&self) -> anyhow::Result<()> {
        self.auth.sign_out().await.context("Sign-out failed")?;
        self.activity.append("Logged out").await;
        println!("Signed out");
        Ok(())
    }

    async fn launch(&self, version: Option<String>) -> anyhow::Result<()> {
        let config = self.config.load_or_init().await?;
        let version = version
            .or_else(|| config.last_version.clone())
            .context("No version given and nothing played yet")?;

        let session = self.login().await?;
        let request = LaunchRequest::from_session(&session, &version, &config, &self.dirs)?;
        let launcher = CommandLauncher::from_config(&config)?.with_activity_log(self.activity.clone());

        let mut handle = launcher.launch(&request).await?;
        remember_launch(&self.config, &request.version).await;

        while let Some(event) = handle.next_event().await {
            match &event {
                LaunchEvent::Data(line) | LaunchEvent::Debug(line) => println!("{}", line),
                _ => println!("{}", event.describe()),
            }
        }

        let outcome = handle.wait().await?;
        if !outcome.success() {
            anyhow::bail!("Game exited with status {:?}", outcome.exit_code);
        }
        Ok(())
    }

    async fn configure(
        &self,
        memory: Option<u64>,
        theme: Option<ThemeArg>,
        java: Option<PathBuf>,
        program: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let unchanged = memory.is_none() && theme.is_none() && java.is_none() && program.is_none();
        let config = if unchanged {
            self.config.load_or_init().await?
        } else {
            self.config
                .update(|config| {
                    if let Some(memory) = memory {
                        config.memory_mb = memory;
                    }
                    if let Some(theme) = theme {
                        config.theme = theme.into();
                    }
                    if let Some(java) = java {
                        config.java_path = Some(java);
                    }
                    if let Some(program) = program {
                        config.launcher_command = Some(program);
                    }
                })
                .await?
        };

        print_config(&config, &self.config);
        Ok(())
    }
}

fn print_config(config: &LauncherConfig, store: &ConfigStore) {
    let unset = || "(auto)".to_string();
    println!("Config file:  {}", store.path().display());
    println!("Memory:       {} MB", config.memory_mb);
    println!("Theme:        {:?}", config.theme);
    match (&config.last_version, &config.last_played) {
        (Some(version), Some(at)) => println!("Last played:  {} at {}", version, at),
        _ => println!("Last played:  (never)"),
    }
    println!(
        "Java:         {}",
        config.java_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(unset)
    );
    println!(
        "Launcher:     {}",
        config
            .launcher_command
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
}

/// Record the launched version; the game keeps running if this fails
async fn remember_launch(config: &ConfigStore, version: &str) {
    if let Err(e) = config.record_played(version).await {
        warn!("Failed to record {} as last played: {:#}", version, e);
    }
}
