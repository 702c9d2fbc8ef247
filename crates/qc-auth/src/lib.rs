//! Microsoft account sign-in for the QuantumCraft launcher
//!
//! This crate turns a Microsoft account login into a Minecraft session and
//! keeps that session on disk between launcher runs.
//!
//! # Authentication Flow
//!
//! 1. Interactive OAuth2 authorization with Microsoft (PKCE + state)
//! 2. Code exchange (or refresh-token exchange) for Microsoft tokens
//! 3. Xbox Live authentication
//! 4. XSTS authorization
//! 5. Minecraft Services login
//! 6. Profile retrieval
//!
//! Every hop must finish before the next one starts. Only the resulting
//! [`Session`] is cached.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qc_auth::{AuthClient, AuthConfig, FileSessionStore, GrantSurface, SessionOrchestrator};
//!
//! # async fn example(surface: &mut dyn GrantSurface) -> Result<(), qc_auth::AuthError> {
//! let client = AuthClient::new(AuthConfig::official_desktop())?;
//! let store = Arc::new(FileSessionStore::new("/tmp/quantumcraft/auth.json").await?);
//! let orchestrator = SessionOrchestrator::new(client, store);
//!
//! let signed_in = orchestrator.authenticate(surface).await?;
//! println!("Logged in as: {}", signed_in.session.profile.name);
//! # Ok(())
//! # }
//! ```
//!
//! # Session Storage
//!
//! ```
//! use qc_auth::{MemorySessionStore, SessionStore};
//!
//! # async fn example() {
//! let store = MemorySessionStore::new();
//! assert!(store.load().await.is_none());
//! # }
//! # tokio_test::block_on(example());
//! ```
//!
//! # Important Notes
//!
//! - Tokens are never logged; `Debug` output of token types is redacted
//! - The Minecraft access token expires after 24 hours; an expired session is
//!   renewed silently with the stored refresh token

pub mod client;
pub mod config;
pub mod errors;
pub mod file_store;
pub mod grant;
pub mod models;
pub mod orchestrator;
pub mod pkce;
pub mod session;
pub mod store;

// Re-export main types
pub use client::{AuthClient, ChainTokens};
pub use config::{AuthConfig, Endpoints, HttpTimeouts};
pub use errors::{AuthError, AuthErrorKind, EntitlementError, Result};
pub use file_store::FileSessionStore;
pub use grant::{GrantRequest, GrantSurface, acquire_grant};
pub use orchestrator::{AuthPath, Authenticated, SessionOrchestrator, StartState};
pub use pkce::{ChallengePair, generate_challenge_pair, generate_state};
pub use session::{
    AuthorizationGrant, GameBearerToken, GameProfile, HopToken, ProfileId, ProviderTokenSet,
    Session,
};
pub use store::{MemorySessionStore, SessionStore};
