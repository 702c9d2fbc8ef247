use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};

use crate::errors::{AuthError, Result};
use crate::session::Session;
use crate::store::SessionStore;

/// File name of the session record inside the launcher data directory.
pub const SESSION_FILE: &str = "auth.json";

/// JSON session record on disk
///
/// # Directory Structure
/// ```text
/// ~/.local/share/quantumcraft/
/// ├── auth.json        # Session record (absent when signed out)
/// └── auth.json.lock   # Advisory lock held while writing
/// ```
///
/// Writes go to a temporary file which is synced and renamed over the
/// record, so a reader sees the old session or the new one.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock_file: PathBuf,
    guard: RwLock<()>,
}

impl FileSessionStore {
    /// Create a file-backed store for the record at `path`
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let lock_file = path.with_extension("json.lock");

        Ok(Self {
            path,
            lock_file,
            guard: RwLock::new(()),
        })
    }

    /// Store rooted in a launcher data directory
    pub async fn in_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(data_dir.as_ref().join(SESSION_FILE)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire an exclusive lock on the storage
    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)?;

        lock_file.try_lock_exclusive().map_err(|_| {
            AuthError::PersistenceFailed("session record is locked by another process".to_string())
        })?;

        Ok(lock_file)
    }

    async fn load_from_disk(&self) -> Result<Option<Session>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session: Session = serde_json::from_str(&content)
            .map_err(|e| AuthError::PersistenceFailed(format!("Invalid session data: {}", e)))?;

        Ok(Some(session))
    }

    async fn save_to_disk(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).map_err(|e| {
            AuthError::PersistenceFailed(format!("Failed to serialize session: {}", e))
        })?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Option<Session> {
        let _read = self.guard.read().await;

        match self.load_from_disk().await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to load session from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    #[instrument(skip(self, session))]
    async fn save(&self, session: &Session) -> Result<()> {
        let _write = self.guard.write().await;
        let _lock = self.acquire_lock()?;

        self.save_to_disk(session).await?;
        debug!("Session saved to {}", self.path.display());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let _write = self.guard.write().await;
        let _lock = self.acquire_lock()?;

        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Session removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
