//! Interactive acquisition of the one-time authorization code.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::client::AuthClient;
use crate::errors::{AuthError, Result};
use crate::pkce::{self, ChallengePair};
use crate::session::AuthorizationGrant;

/// An interactive, network-capable page the user signs in through.
///
/// Implementations report every navigation they observe. Returning `None`
/// from [`GrantSurface::next_navigation`] means the user closed the surface.
#[async_trait::async_trait]
pub trait GrantSurface: Send {
    /// Show the sign-in page
    async fn open(&mut self, authorize_url: &Url) -> Result<()>;

    /// Wait for the next navigation or redirect inside the surface
    async fn next_navigation(&mut self) -> Option<String>;

    /// Tear the surface down; called once a terminal navigation is seen
    async fn close(&mut self);
}

/// Everything generated for one interactive attempt.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub authorize_url: Url,
    pub state: String,
    pub pkce: ChallengePair,
}

impl GrantRequest {
    pub fn new(client: &AuthClient) -> Self {
        let state = pkce::generate_state();
        let pkce = pkce::generate_challenge_pair();
        let authorize_url = client.build_authorize_url(&state, &pkce.challenge);
        Self {
            authorize_url,
            state,
            pkce,
        }
    }
}

/// Drive `surface` until the desktop callback arrives or the user gives up.
#[instrument(skip_all)]
pub async fn acquire_grant(
    surface: &mut dyn GrantSurface,
    redirect_uri: &Url,
    request: &GrantRequest,
) -> Result<AuthorizationGrant> {
    info!("Opening sign-in surface");
    if let Err(e) = surface.open(&request.authorize_url).await {
        warn!("Failed to open sign-in surface: {}", e);
        surface.close().await;
        return Err(e);
    }

    while let Some(navigation) = surface.next_navigation().await {
        let Some(result) = inspect_navigation(&navigation, redirect_uri, &request.state) else {
            continue;
        };

        surface.close().await;
        if let Err(e) = &result {
            warn!("Sign-in callback rejected: {}", e);
        } else {
            debug!("Authorization code received");
        }
        return result;
    }

    info!("Sign-in surface closed by the user");
    surface.close().await;
    Err(AuthError::UserCancelled)
}

/// `None` for navigations that are not the desktop callback.
fn inspect_navigation(
    navigation: &str,
    redirect_uri: &Url,
    expected_state: &str,
) -> Option<Result<AuthorizationGrant>> {
    let url = Url::parse(navigation).ok()?;
    if url.origin() != redirect_uri.origin() || url.path() != redirect_uri.path() {
        return None;
    }

    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        let reason = match params.get("error_description") {
            Some(description) => format!("{}: {}", error, description),
            None => error.clone(),
        };
        return Some(Err(AuthError::ProviderDenied(reason)));
    }

    match params.get("state") {
        Some(actual) if actual == expected_state => {}
        _ => return Some(Err(AuthError::StateMismatch)),
    }

    Some(
        params
            .get("code")
            .filter(|code| !code.is_empty())
            .map(|code| AuthorizationGrant {
                code: code.clone(),
                state: expected_state.to_string(),
            })
            .ok_or_else(|| {
                AuthError::ProviderDenied("callback carried no authorization code".to_string())
            }),
    )
}
