use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AVATAR_BASE;

/// One-time authorization code captured from the desktop redirect.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub code: String,
    pub state: String,
}

impl std::fmt::Debug for AuthorizationGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGrant")
            .field("code", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// Microsoft OAuth tokens
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderTokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl std::fmt::Debug for ProviderTokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Xbox Live or XSTS token together with its user hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopToken {
    pub token: String,
    pub user_hash: String,
}

impl HopToken {
    /// Identity token accepted by Minecraft services.
    pub fn identity_token(&self) -> String {
        format!("XBL3.0 x={};{}", self.user_hash, self.token)
    }
}

/// Minecraft access token
#[derive(Clone, PartialEq, Eq)]
pub struct GameBearerToken {
    pub access_token: String,
    pub expires_in: u64,
}

impl std::fmt::Debug for GameBearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameBearerToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// 32 hex digit account identifier, stored without separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid profile id {0:?}: expected 32 hex digits")]
pub struct InvalidProfileId(pub String);

impl ProfileId {
    /// Accepts the raw form or the hyphenated form.
    pub fn parse(value: &str) -> Result<Self, InvalidProfileId> {
        let raw: String = value.chars().filter(|c| *c != '-').collect();
        if raw.len() != 32 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidProfileId(value.to_string()));
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Canonical 8-4-4-4-12 rendering.
    pub fn formatted(&self) -> String {
        let r = &self.0;
        format!(
            "{}-{}-{}-{}-{}",
            &r[0..8],
            &r[8..12],
            &r[12..16],
            &r[16..20],
            &r[20..32]
        )
    }
}

impl TryFrom<String> for ProfileId {
    type Error = InvalidProfileId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Minecraft account profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameProfile {
    pub id: ProfileId,
    pub name: String,
    /// Avatar URL derived from the id
    pub skin: String,
}

impl GameProfile {
    pub fn new(id: ProfileId, name: String) -> Self {
        let skin = avatar_url(&id);
        Self { id, name, skin }
    }

    pub fn raw_identifier(&self) -> &str {
        self.id.raw()
    }

    pub fn formatted_identifier(&self) -> String {
        self.id.formatted()
    }
}

pub fn avatar_url(id: &ProfileId) -> String {
    format!("{}/{}/100", AVATAR_BASE, id.raw())
}

/// The persisted login: profile plus the credentials needed to launch and renew.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub profile: GameProfile,
    pub game_access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_refresh_token: Option<String>,
    /// Epoch milliseconds
    pub absolute_expiry: i64,
    pub user_hash: String,
}

impl Session {
    pub fn new(
        profile: GameProfile,
        bearer: &GameBearerToken,
        provider_refresh_token: Option<String>,
        user_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        let lifetime_ms = i64::try_from(bearer.expires_in)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        Self {
            profile,
            game_access_token: bearer.access_token.clone(),
            provider_refresh_token,
            absolute_expiry: now.timestamp_millis().saturating_add(lifetime_ms),
            user_hash,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.absolute_expiry
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.absolute_expiry).single()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("profile", &self.profile)
            .field("game_access_token", &"[REDACTED]")
            .field(
                "provider_refresh_token",
                &self.provider_refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("absolute_expiry", &self.absolute_expiry)
            .field("user_hash", &self.user_hash)
            .finish()
    }
}
