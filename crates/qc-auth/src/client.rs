use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{AuthConfig, RP_MINECRAFT, RP_XBOX_AUTH};
use crate::errors::{AuthError, EntitlementError, Result};
use crate::models::*;
use crate::session::{GameBearerToken, GameProfile, HopToken, ProfileId, ProviderTokenSet};

/// Tokens produced by one full pass through hops B, C and D.
#[derive(Debug, Clone)]
pub struct ChainTokens {
    pub provider: ProviderTokenSet,
    pub entitlement: HopToken,
    pub bearer: GameBearerToken,
}

/// HTTP client for the Microsoft → Xbox Live → XSTS → Minecraft chain.
///
/// Each hop is a separate method so the orchestrator can enter the chain at
/// the code exchange or at the refresh exchange.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: Client,
}

impl AuthClient {
    /// Create a new authentication client
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("quantumcraft"))
            .build()
            .map_err(|e| AuthError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the authorization URL for the sign-in surface
    #[instrument(skip(self, state, code_challenge))]
    pub fn build_authorize_url(&self, state: &str, code_challenge: &str) -> Url {
        let mut url = self.config.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("prompt", "select_account");

        debug!("Built authorize URL for {}", url.path());
        url
    }

    /// Hop A: exchange authorization code for Microsoft tokens
    #[instrument(skip(self, code, code_verifier))]
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<ProviderTokenSet> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!("Exchanging authorization code for tokens");
        let response = self
            .http
            .post(self.config.endpoints.token.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(transport_detail(&e)))?;

        if !response.status().is_success() {
            return Err(AuthError::ExchangeFailed(oauth_error_detail(response).await));
        }

        let token_response: MsTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(format!("invalid token response: {}", e)))?;
        Ok(token_response.into())
    }

    /// Hop A': trade a stored refresh token for a new (rotated) token set
    ///
    /// Every failure is reported as [`AuthError::RefreshExpired`]; the caller
    /// falls back to interactive login.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_provider_token(&self, refresh_token: &str) -> Result<ProviderTokenSet> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        debug!("Refreshing Microsoft access token");
        let response = match self
            .http
            .post(self.config.endpoints.token.clone())
            .form(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Refresh request failed: {}", transport_detail(&e));
                return Err(AuthError::RefreshExpired);
            }
        };

        if !response.status().is_success() {
            warn!("Refresh rejected: {}", oauth_error_detail(response).await);
            return Err(AuthError::RefreshExpired);
        }

        match response.json::<MsTokenResponse>().await {
            Ok(token_response) => Ok(token_response.into()),
            Err(e) => {
                warn!("Invalid refresh response: {}", e);
                Err(AuthError::RefreshExpired)
            }
        }
    }

    /// Hop B: authenticate with Xbox Live
    #[instrument(skip(self, ms_access_token))]
    pub async fn xbl_authenticate(&self, ms_access_token: &str) -> Result<HopToken> {
        let request = XblAuthRequest {
            properties: XblAuthProperties {
                auth_method: "RPS".to_string(),
                site_name: "user.auth.xboxlive.com".to_string(),
                rps_ticket: format!("d={}", ms_access_token),
            },
            relying_party: RP_XBOX_AUTH.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("Authenticating with Xbox Live");
        let response = self
            .http
            .post(self.config.endpoints.xbl_authenticate.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::PlatformAuthFailed(transport_detail(&e)))?;

        if !response.status().is_success() {
            return Err(AuthError::PlatformAuthFailed(http_detail(response).await));
        }

        let xbl_response: XboxTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::PlatformAuthFailed(format!("invalid response: {}", e)))?;
        hop_token(xbl_response).ok_or_else(|| {
            AuthError::PlatformAuthFailed("Missing XUI claims".to_string())
        })
    }

    /// Hop C: authorize with XSTS for the Minecraft relying party
    #[instrument(skip(self, xbl_token))]
    pub async fn xsts_authorize(&self, xbl_token: &str) -> Result<HopToken> {
        let request = XstsAuthRequest {
            properties: XstsAuthProperties {
                sandbox_id: "RETAIL".to_string(),
                user_tokens: vec![xbl_token.to_string()],
            },
            relying_party: RP_MINECRAFT.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("Authorizing with XSTS");
        let response = self
            .http
            .post(self.config.endpoints.xsts_authorize.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EntitlementError::Service(transport_detail(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<XstsErrorResponse>(&body) {
                let err = EntitlementError::from_xerr(error_response.xerr);
                warn!("XSTS denied the account: {}", err);
                return Err(err.into());
            }
            return Err(EntitlementError::Service(format!(
                "HTTP {}: {}",
                status,
                snippet(&body)
            ))
            .into());
        }

        let xsts_response: XboxTokenResponse = response
            .json()
            .await
            .map_err(|e| EntitlementError::Service(format!("invalid response: {}", e)))?;
        hop_token(xsts_response)
            .ok_or_else(|| EntitlementError::Service("Missing XUI claims".to_string()).into())
    }

    /// Hop D: log in to Minecraft services with the XSTS token
    #[instrument(skip(self, xsts))]
    pub async fn mc_login(&self, xsts: &HopToken) -> Result<GameBearerToken> {
        let request = McLoginRequest {
            identity_token: xsts.identity_token(),
        };

        debug!("Logging in to Minecraft Services");
        let response = self
            .http
            .post(self.config.endpoints.mc_login.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::GameAuthFailed(transport_detail(&e)))?;

        if !response.status().is_success() {
            return Err(AuthError::GameAuthFailed(mc_error_detail(response).await));
        }

        let mc_response: McLoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::GameAuthFailed(format!("invalid response: {}", e)))?;
        Ok(GameBearerToken {
            access_token: mc_response.access_token,
            expires_in: mc_response.expires_in,
        })
    }

    /// Fetch the Minecraft profile owned by the bearer
    #[instrument(skip(self, bearer))]
    pub async fn resolve_profile(&self, bearer: &GameBearerToken) -> Result<GameProfile> {
        debug!("Fetching Minecraft profile");
        let response = self
            .http
            .get(self.config.endpoints.mc_profile.clone())
            .bearer_auth(&bearer.access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(transport_detail(&e)))?;

        let status = response.status();

        // No profile means the account never bought the game
        if status == StatusCode::NOT_FOUND {
            return Err(AuthError::NoEntitlement);
        }

        if !status.is_success() {
            return Err(AuthError::ProfileFetchFailed(mc_error_detail(response).await));
        }

        let profile: McProfileResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(format!("invalid response: {}", e)))?;
        let id = ProfileId::parse(&profile.id)
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        debug!("Resolved profile {}", profile.name);
        Ok(GameProfile::new(id, profile.name))
    }

    /// Hops B → C → D starting from a fresh Microsoft token set
    #[instrument(skip(self, provider))]
    pub async fn authenticate_provider_tokens(
        &self,
        provider: ProviderTokenSet,
    ) -> Result<ChainTokens> {
        let xbl = self.xbl_authenticate(&provider.access_token).await?;
        let xsts = self.xsts_authorize(&xbl.token).await?;
        let bearer = self.mc_login(&xsts).await?;

        Ok(ChainTokens {
            provider,
            entitlement: xsts,
            bearer,
        })
    }

    /// Hop A followed by B → C → D
    #[instrument(skip(self, code, code_verifier))]
    pub async fn complete_login_with_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ChainTokens> {
        debug!("Starting complete login flow");
        let provider = self.exchange_code(code, code_verifier).await?;
        self.authenticate_provider_tokens(provider).await
    }
}

impl From<MsTokenResponse> for ProviderTokenSet {
    fn from(response: MsTokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
        }
    }
}

fn hop_token(response: XboxTokenResponse) -> Option<HopToken> {
    let uhs = response.display_claims.xui.into_iter().next()?.uhs;
    Some(HopToken {
        token: response.token,
        user_hash: uhs,
    })
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

fn transport_detail(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

async fn http_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("HTTP {}: {}", status, snippet(&body))
}

async fn oauth_error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<MsErrorResponse>(&body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        },
        Err(_) => format!("HTTP {}: {}", status, snippet(&body)),
    }
}

async fn mc_error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<McErrorResponse>(&body) {
        Ok(McErrorResponse {
            error_message: Some(message),
            ..
        }) => format!("HTTP {}: {}", status, message),
        _ => format!("HTTP {}: {}", status, snippet(&body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::errors::AuthErrorKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_client(server: &MockServer) -> AuthClient {
        let config = AuthConfig::official_desktop()
            .with_endpoints(Endpoints::with_base(&server.uri()).unwrap());
        AuthClient::new(config).unwrap()
    }

    fn xbox_body(token: &str, uhs: &str) -> serde_json::Value {
        json!({
            "IssueInstant": "2024-01-01T00:00:00.0000000Z",
            "NotAfter": "2024-01-15T00:00:00.0000000Z",
            "Token": token,
            "DisplayClaims": { "xui": [ { "uhs": uhs } ] }
        })
    }

    #[test]
    fn test_authorize_url_carries_state_and_challenge() {
        let client = AuthClient::new(AuthConfig::official_desktop()).unwrap();
        let url = client.build_authorize_url("st4te", "ch4llenge");
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["state"], "st4te");
        assert_eq!(pairs["code_challenge"], "ch4llenge");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "https://login.live.com/oauth20_desktop.srf");
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form_with_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth20_token.srf"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "bearer",
                "expires_in": 3600,
                "access_token": "ms-access",
                "refresh_token": "ms-refresh"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let tokens = client.exchange_code("the-code", "the-verifier").await.unwrap();
        assert_eq!(tokens.access_token, "ms-access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("ms-refresh"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_exchange_code_failure_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth20_token.srf"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "The provided value for the 'code' parameter is not valid."
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.exchange_code("bad", "v").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExchangeFailed);
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_refresh_expired() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth20_token.srf"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.refresh_provider_token("stale").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::RefreshExpired);
    }

    #[tokio::test]
    async fn test_xbl_sends_prefixed_ticket() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_partial_json(json!({
                "Properties": { "AuthMethod": "RPS", "RpsTicket": "d=ms-access" },
                "RelyingParty": "http://auth.xboxlive.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xbox_body("xbl", "hash1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let hop = client.xbl_authenticate("ms-access").await.unwrap();
        assert_eq!(hop.token, "xbl");
        assert_eq!(hop.user_hash, "hash1");
    }

    #[tokio::test]
    async fn test_xbl_missing_claims_is_platform_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Token": "xbl",
                "DisplayClaims": { "xui": [] }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.xbl_authenticate("ms-access").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::PlatformAuthFailed);
    }

    #[tokio::test]
    async fn test_xsts_classifies_xerr() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "Identity": "0",
                "XErr": 2148916238u64,
                "Message": "",
                "Redirect": "https://start.ui.xboxlive.com/AddChildToFamily"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.xsts_authorize("xbl").await.unwrap_err();
        match err {
            AuthError::EntitlementAuthFailed(EntitlementError::ChildAccountRequiresFamily) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_xsts_unknown_code_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "XErr": 2148916999u64 })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.xsts_authorize("xbl").await.unwrap_err();
        assert!(err.to_string().contains("2148916999"));
    }

    #[tokio::test]
    async fn test_mc_login_sends_identity_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authentication/login_with_xbox"))
            .and(body_partial_json(json!({ "identityToken": "XBL3.0 x=hash2;xsts" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "some-uuid",
                "roles": [],
                "access_token": "mc-access",
                "token_type": "Bearer",
                "expires_in": 86400
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let xsts = HopToken {
            token: "xsts".to_string(),
            user_hash: "hash2".to_string(),
        };
        let bearer = client.mc_login(&xsts).await.unwrap();
        assert_eq!(bearer.access_token, "mc-access");
        assert_eq!(bearer.expires_in, 86400);
    }

    #[tokio::test]
    async fn test_mc_login_failure_is_game_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authentication/login_with_xbox"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let xsts = HopToken {
            token: "xsts".to_string(),
            user_hash: "hash2".to_string(),
        };
        let err = client.mc_login(&xsts).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::GameAuthFailed);
    }

    #[tokio::test]
    async fn test_resolve_profile_formats_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .and(header("authorization", "Bearer mc-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "069a79f444e94726a5befca90e38aaf5",
                "name": "Notch",
                "skins": [],
                "capes": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let bearer = GameBearerToken {
            access_token: "mc-access".to_string(),
            expires_in: 60,
        };
        let profile = client.resolve_profile(&bearer).await.unwrap();
        assert_eq!(profile.name, "Notch");
        assert_eq!(profile.raw_identifier(), "069a79f444e94726a5befca90e38aaf5");
        assert_eq!(
            profile.formatted_identifier(),
            "069a79f4-44e9-4726-a5be-fca90e38aaf5"
        );
    }

    #[tokio::test]
    async fn test_resolve_profile_not_found_is_no_entitlement() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "path": "/minecraft/profile",
                "errorType": "NOT_FOUND",
                "error": "NOT_FOUND",
                "errorMessage": "The server has not found anything matching the request URI"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let bearer = GameBearerToken {
            access_token: "mc-access".to_string(),
            expires_in: 60,
        };
        let err = client.resolve_profile(&bearer).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::NoEntitlement);
    }

    #[tokio::test]
    async fn test_resolve_profile_server_error_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let bearer = GameBearerToken {
            access_token: "mc-access".to_string(),
            expires_in: 60,
        };
        let err = client.resolve_profile(&bearer).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ProfileFetchFailed);
    }

    #[tokio::test]
    async fn test_slow_hop_times_out_with_hop_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(xbox_body("xbl", "h"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut config = AuthConfig::official_desktop()
            .with_endpoints(Endpoints::with_base(&server.uri()).unwrap());
        config.http_timeouts.request = Duration::from_millis(200);
        let client = AuthClient::new(config).unwrap();

        let err = client.xbl_authenticate("ms").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::PlatformAuthFailed);
        assert!(err.to_string().contains("timed out"));
    }
}
