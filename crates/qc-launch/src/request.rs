use std::path::PathBuf;

use chrono::Utc;
use qc_auth::Session;
use qc_core::{AppDirs, LauncherConfig};

use crate::errors::{LaunchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Everything the game launcher needs to start one version
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub version: String,
    pub username: String,
    /// Hyphenated profile id
    pub uuid: String,
    pub access_token: String,
    pub user_hash: String,
    pub max_memory_mb: u64,
    pub min_memory_mb: u64,
    pub window: WindowSize,
    pub game_dir: PathBuf,
    pub java_path: Option<PathBuf>,
}

impl LaunchRequest {
    pub fn from_session(
        session: &Session,
        version: &str,
        config: &LauncherConfig,
        dirs: &AppDirs,
    ) -> Result<Self> {
        Self::from_session_at(session, version, config, dirs, Utc::now().timestamp_millis())
    }

    /// Build a request against an explicit clock
    pub fn from_session_at(
        session: &Session,
        version: &str,
        config: &LauncherConfig,
        dirs: &AppDirs,
        now_ms: i64,
    ) -> Result<Self> {
        if session.is_expired_at(now_ms) {
            return Err(LaunchError::SessionExpired);
        }

        let version = version.trim();
        if version.is_empty() {
            return Err(LaunchError::MissingVersion);
        }

        Ok(Self {
            version: version.to_string(),
            username: session.profile.name.clone(),
            uuid: session.profile.formatted_identifier(),
            access_token: session.game_access_token.clone(),
            user_hash: session.user_hash.clone(),
            max_memory_mb: config.memory_mb,
            min_memory_mb: config.memory_mb / 2,
            window: WindowSize::default(),
            game_dir: dirs.root().to_path_buf(),
            java_path: config.java_path.clone(),
        })
    }
}

impl std::fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("version", &self.version)
            .field("username", &self.username)
            .field("uuid", &self.uuid)
            .field("access_token", &"[REDACTED]")
            .field("max_memory_mb", &self.max_memory_mb)
            .field("min_memory_mb", &self.min_memory_mb)
            .field("window", &self.window)
            .field("game_dir", &self.game_dir)
            .field("java_path", &self.java_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_auth::{GameBearerToken, GameProfile, ProfileId};

    fn session() -> Session {
        let profile = GameProfile::new(
            ProfileId::parse("069a79f444e94726a5befca90e38aaf5").unwrap(),
            "Notch".to_string(),
        );
        let bearer = GameBearerToken {
            access_token: "mc-secret".to_string(),
            expires_in: 86400,
        };
        Session::new(profile, &bearer, None, "uhs".to_string(), Utc::now())
    }

    #[test]
    fn test_from_session() {
        let session = session();
        let config = LauncherConfig {
            memory_mb: 6144,
            java_path: Some(PathBuf::from("/opt/java/bin/java")),
            ..Default::default()
        };
        let dirs = AppDirs::at("/data/QuantumCraft");

        let request = LaunchRequest::from_session(&session, " 1.21.1 ", &config, &dirs).unwrap();

        assert_eq!(request.version, "1.21.1");
        assert_eq!(request.username, "Notch");
        assert_eq!(request.uuid, "069a79f4-44e9-4726-a5be-fca90e38aaf5");
        assert_eq!(request.access_token, "mc-secret");
        assert_eq!(request.max_memory_mb, 6144);
        assert_eq!(request.min_memory_mb, 3072);
        assert_eq!(request.window, WindowSize { width: 1280, height: 720 });
        assert_eq!(request.game_dir, PathBuf::from("/data/QuantumCraft"));
        assert_eq!(request.java_path, config.java_path);
    }

    #[test]
    fn test_odd_memory_rounds_down() {
        let config = LauncherConfig {
            memory_mb: 3001,
            ..Default::default()
        };
        let request =
            LaunchRequest::from_session(&session(), "1.20.4", &config, &AppDirs::at("/tmp"))
                .unwrap();
        assert_eq!(request.min_memory_mb, 1500);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let session = session();
        let result = LaunchRequest::from_session_at(
            &session,
            "1.21.1",
            &LauncherConfig::default(),
            &AppDirs::at("/tmp"),
            session.absolute_expiry,
        );
        assert!(matches!(result, Err(LaunchError::SessionExpired)));
    }

    #[test]
    fn test_blank_version_is_rejected() {
        let result = LaunchRequest::from_session(
            &session(),
            "  ",
            &LauncherConfig::default(),
            &AppDirs::at("/tmp"),
        );
        assert!(matches!(result, Err(LaunchError::MissingVersion)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let request = LaunchRequest::from_session(
            &session(),
            "1.21.1",
            &LauncherConfig::default(),
            &AppDirs::at("/tmp"),
        )
        .unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("mc-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
