use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of random bytes behind a code verifier (43 base64url characters).
const VERIFIER_BYTES: usize = 32;

/// Number of random bytes behind an OAuth state value (22 base64url characters).
const STATE_BYTES: usize = 16;

/// PKCE verifier and its S256 challenge, generated once per login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct ChallengePair {
    pub verifier: String,
    pub challenge: String,
}

impl std::fmt::Debug for ChallengePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengePair")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Generates a fresh verifier and the matching challenge.
#[must_use]
pub fn generate_challenge_pair() -> ChallengePair {
    let random_bytes: [u8; VERIFIER_BYTES] = rand::rng().random();
    let verifier = URL_SAFE_NO_PAD.encode(random_bytes);
    let challenge = code_challenge(&verifier);
    ChallengePair {
        verifier,
        challenge,
    }
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`, hashed over the encoded text of
/// the verifier, not the random bytes behind it.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates a cryptographically random state parameter for `OAuth2`.
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; STATE_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}
