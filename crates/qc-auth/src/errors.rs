use thiserror::Error;

/// Failures of a single authentication attempt.
///
/// Every hop of the chain has its own variant so callers can tell where the
/// attempt stopped without parsing messages.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Sign-in window was closed before the login completed")]
    UserCancelled,

    #[error("Microsoft refused the authorization: {0}")]
    ProviderDenied(String),

    #[error("OAuth state mismatch - possible CSRF attack")]
    StateMismatch,

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Refresh token expired or was revoked - sign in again")]
    RefreshExpired,

    #[error("Xbox Live authentication failed: {0}")]
    PlatformAuthFailed(String),

    #[error("XSTS authorization denied: {0}")]
    EntitlementAuthFailed(#[from] EntitlementError),

    #[error("Minecraft services login failed: {0}")]
    GameAuthFailed(String),

    #[error("This Microsoft account does not own Minecraft: Java Edition - buy the game on minecraft.net")]
    NoEntitlement,

    #[error("Minecraft profile request failed: {0}")]
    ProfileFetchFailed(String),

    #[error("Failed to persist session: {0}")]
    PersistenceFailed(String),

    #[error("Another sign-in attempt is already running")]
    AttemptInProgress,

    #[error("Invalid authentication configuration: {0}")]
    InvalidConfig(String),
}

/// Machine-readable discriminant of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    UserCancelled,
    ProviderDenied,
    StateMismatch,
    ExchangeFailed,
    RefreshExpired,
    PlatformAuthFailed,
    EntitlementAuthFailed,
    GameAuthFailed,
    NoEntitlement,
    ProfileFetchFailed,
    PersistenceFailed,
    AttemptInProgress,
    InvalidConfig,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::UserCancelled => AuthErrorKind::UserCancelled,
            Self::ProviderDenied(_) => AuthErrorKind::ProviderDenied,
            Self::StateMismatch => AuthErrorKind::StateMismatch,
            Self::ExchangeFailed(_) => AuthErrorKind::ExchangeFailed,
            Self::RefreshExpired => AuthErrorKind::RefreshExpired,
            Self::PlatformAuthFailed(_) => AuthErrorKind::PlatformAuthFailed,
            Self::EntitlementAuthFailed(_) => AuthErrorKind::EntitlementAuthFailed,
            Self::GameAuthFailed(_) => AuthErrorKind::GameAuthFailed,
            Self::NoEntitlement => AuthErrorKind::NoEntitlement,
            Self::ProfileFetchFailed(_) => AuthErrorKind::ProfileFetchFailed,
            Self::PersistenceFailed(_) => AuthErrorKind::PersistenceFailed,
            Self::AttemptInProgress => AuthErrorKind::AttemptInProgress,
            Self::InvalidConfig(_) => AuthErrorKind::InvalidConfig,
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::PersistenceFailed(err.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// XSTS-specific error codes from XErr field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("This Microsoft account has no Xbox account - create one on xbox.com (XErr: 2148916233)")]
    NoXboxAccount,

    #[error("Xbox Live is unavailable in this country or the account needs parental consent (XErr: 2148916235)")]
    RegionRestricted,

    #[error("Adult verification required on the Xbox page (XErr: 2148916236/2148916237)")]
    AdultVerificationRequired,

    #[error("Child account must be added to a Family on account.microsoft.com (XErr: 2148916238)")]
    ChildAccountRequiresFamily,

    #[error("Unknown XSTS error code: {0}")]
    Unknown(u64),

    #[error("XSTS request failed: {0}")]
    Service(String),
}

impl EntitlementError {
    /// Parse XErr code from XSTS response
    pub fn from_xerr(code: u64) -> Self {
        match code {
            2148916233 => Self::NoXboxAccount,
            2148916235 => Self::RegionRestricted,
            2148916236 | 2148916237 => Self::AdultVerificationRequired,
            2148916238 => Self::ChildAccountRequiresFamily,
            code => Self::Unknown(code),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
