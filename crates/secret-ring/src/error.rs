//! Error types for the secret ring and token service.

use thiserror::Error;

/// Errors surfaced by [`SecretRing`](crate::ring::SecretRing) and
/// [`TokenService`](crate::token_service::TokenService).
///
/// None of these are retried inside this crate. Retry policy belongs to the
/// scheduler or request handler that called in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyringError {
    /// The ring holds no secret yet. Recoverable after a rotation completes.
    #[error("No active signing secret")]
    NoActiveSecret,

    /// Verification failed under every active secret.
    ///
    /// Bad signature, evicted secret, expiry and malformed input all map here
    /// with the same message so callers cannot probe the verifier.
    #[error("The access token is invalid or expired")]
    TokenInvalid,

    /// Secure randomness could not be obtained. Fatal to the rotation.
    #[error("Entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),

    /// The payload used a claim name the token format owns.
    #[error("Payload may not set reserved claim: {0}")]
    ReservedClaim(String),

    /// The codec failed to produce a token.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Result type alias using `KeyringError`
pub type Result<T> = std::result::Result<T, KeyringError>;
