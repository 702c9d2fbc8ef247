use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::client::{AuthClient, ChainTokens};
use crate::errors::{AuthError, Result};
use crate::grant::{self, GrantRequest, GrantSurface};
use crate::session::{GameProfile, ProviderTokenSet, Session};
use crate::store::SessionStore;

/// What the launcher finds on disk at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartState {
    /// No stored session
    ColdStart,
    /// A stored session, possibly expired
    WarmStart(Session),
}

impl StartState {
    /// True when the stored session can be used without any network call.
    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        match self {
            Self::ColdStart => false,
            Self::WarmStart(session) => !session.is_expired_at(now_ms),
        }
    }
}

/// How a successful attempt obtained its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPath {
    /// Stored session still valid, no network traffic
    Stored,
    /// Silent refresh-token renewal
    Renewed,
    /// Interactive sign-in
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub session: Session,
    pub via: AuthPath,
}

/// Owns the session store and serializes sign-in attempts.
///
/// The grant surface is borrowed per attempt, so no window handle outlives
/// the attempt that opened it.
pub struct SessionOrchestrator {
    client: AuthClient,
    store: Arc<dyn SessionStore>,
    attempt: Mutex<()>,
}

impl SessionOrchestrator {
    pub fn new(client: AuthClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            attempt: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Read the stored session to pick the initial UI state
    pub async fn start_state(&self) -> StartState {
        match self.store.load().await {
            Some(session) => StartState::WarmStart(session),
            None => StartState::ColdStart,
        }
    }

    /// Produce a valid session: stored, renewed, or freshly signed in.
    ///
    /// Only one attempt runs at a time; a concurrent call fails with
    /// [`AuthError::AttemptInProgress`].
    #[instrument(skip_all)]
    pub async fn authenticate(&self, surface: &mut dyn GrantSurface) -> Result<Authenticated> {
        let _attempt = self
            .attempt
            .try_lock()
            .map_err(|_| AuthError::AttemptInProgress)?;

        let state = self.start_state().await;
        let still_valid = state.is_authenticated_at(Utc::now().timestamp_millis());

        if let StartState::WarmStart(stored) = state {
            if still_valid {
                info!("Using stored session for {}", stored.profile.name);
                return Ok(Authenticated {
                    session: stored,
                    via: AuthPath::Stored,
                });
            }

            match self.renew(&stored).await {
                Ok(session) => {
                    info!("Session renewed for {}", session.profile.name);
                    return Ok(Authenticated {
                        session,
                        via: AuthPath::Renewed,
                    });
                }
                Err(e) => warn!("Silent renewal failed, falling back to sign-in: {}", e),
            }
        }

        let session = self.sign_in(surface).await?;
        info!("Signed in as {}", session.profile.name);
        Ok(Authenticated {
            session,
            via: AuthPath::Interactive,
        })
    }

    /// Remove the stored session
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let _attempt = self
            .attempt
            .try_lock()
            .map_err(|_| AuthError::AttemptInProgress)?;

        self.store.clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Hops A' → B → C → D → profile, reusing the stored account
    ///
    /// Once the provider has rotated the refresh token the stored one is
    /// spent, so a failure past that point removes the stored record.
    async fn renew(&self, stored: &Session) -> Result<Session> {
        let refresh_token = stored
            .provider_refresh_token
            .as_deref()
            .ok_or(AuthError::RefreshExpired)?;

        let provider = self.client.refresh_provider_token(refresh_token).await?;
        let rotated = provider.refresh_token.is_some();

        let result = self.finish_renewal(stored, provider, refresh_token).await;
        if result.is_err() && rotated {
            warn!("Renewal failed after the refresh token was rotated, discarding stored session");
            if let Err(e) = self.store.clear().await {
                warn!("Failed to discard stale session: {}", e);
            }
        }
        result
    }

    async fn finish_renewal(
        &self,
        stored: &Session,
        provider: ProviderTokenSet,
        refresh_token: &str,
    ) -> Result<Session> {
        let tokens = self.client.authenticate_provider_tokens(provider).await?;
        let profile = self.client.resolve_profile(&tokens.bearer).await?;
        if profile.id != stored.profile.id {
            return Err(AuthError::ProfileFetchFailed(
                "renewed account does not match the stored profile".to_string(),
            ));
        }

        self.persist(tokens, profile, Some(refresh_token)).await
    }

    /// Interactive grant → A → B → C → D → profile
    async fn sign_in(&self, surface: &mut dyn GrantSurface) -> Result<Session> {
        let request = GrantRequest::new(&self.client);
        let grant =
            grant::acquire_grant(surface, &self.client.config().redirect_uri, &request).await?;

        let tokens = self
            .client
            .complete_login_with_code(&grant.code, &request.pkce.verifier)
            .await?;
        let profile = self.client.resolve_profile(&tokens.bearer).await?;

        self.persist(tokens, profile, None).await
    }

    async fn persist(
        &self,
        tokens: ChainTokens,
        profile: GameProfile,
        previous_refresh_token: Option<&str>,
    ) -> Result<Session> {
        // The provider may omit a new refresh token; the one just used is then still current
        let refresh_token = tokens
            .provider
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string));

        let session = Session::new(
            profile,
            &tokens.bearer,
            refresh_token,
            tokens.entitlement.user_hash,
            Utc::now(),
        );
        self.store.save(&session).await?;
        Ok(session)
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
