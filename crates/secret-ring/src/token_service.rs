//! Token signing and verification against the secret ring.
//!
//! Signing always uses the ring's newest secret. Verification takes one
//! snapshot of the active secrets and tries them newest first, so the common
//! case (token signed since the last rotation) costs a single HMAC.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any decoding
//! - Every verification failure is reported as the same
//!   [`KeyringError::TokenInvalid`]; the reason is only logged at debug level
//! - The snapshot is taken once per call, so a rotation racing with a verify
//!   cannot make it check a mix of old and new ring states

use crate::config::KeyringConfig;
use crate::error::{KeyringError, Result};
use crate::jwt::{JwtCodec, Payload, TokenClaims, TokenCodec, MAX_TOKEN_SIZE_BYTES, RESERVED_CLAIMS};
use crate::observability::{record_token_signing, record_token_verification};
use crate::ring::SecretRing;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Issues and verifies tokens using a shared [`SecretRing`].
pub struct TokenService {
    ring: Arc<SecretRing>,
    codec: Arc<dyn TokenCodec>,
    token_ttl: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    ///
    /// * `ring` - Secret ring shared with whatever schedules rotation
    /// * `codec` - Token format used to sign and verify
    /// * `token_ttl` - Validity window stamped into each token
    #[must_use]
    pub fn new(ring: Arc<SecretRing>, codec: Arc<dyn TokenCodec>, token_ttl: Duration) -> Self {
        Self {
            ring,
            codec,
            token_ttl,
        }
    }

    /// Create a token service issuing HS256 JWTs with the configured TTL.
    #[must_use]
    pub fn from_config(ring: Arc<SecretRing>, config: &KeyringConfig) -> Self {
        Self::new(ring, Arc::new(JwtCodec::new()), config.token_ttl)
    }

    /// Sign `payload` with the current secret.
    ///
    /// The token carries `iat = now` and `exp = now + token_ttl`.
    ///
    /// # Errors
    ///
    /// - `NoActiveSecret` - the ring has not been rotated yet
    /// - `ReservedClaim` - the payload sets `iat` or `exp`
    /// - `Signing` - the codec failed to encode
    #[instrument(skip_all)]
    pub fn sign(&self, payload: &Payload) -> Result<String> {
        self.sign_at(payload, Utc::now())
    }

    /// Deterministic signing against an explicit issue time.
    ///
    /// Prefer [`TokenService::sign`] in production code. This variant exists
    /// so expiry boundaries can be tested without waiting on the wall clock.
    pub(crate) fn sign_at(&self, payload: &Payload, issued_at: DateTime<Utc>) -> Result<String> {
        if let Some(name) = RESERVED_CLAIMS.iter().find(|name| payload.contains_key(**name)) {
            record_token_signing("error");
            return Err(KeyringError::ReservedClaim((*name).to_string()));
        }

        let secret = self.ring.current().inspect_err(|_| {
            tracing::warn!(target: "secret_ring.token", "Sign requested before first rotation");
            record_token_signing("error");
        })?;

        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims::new(payload.clone(), iat, iat.saturating_add(ttl_secs));

        let token = self.codec.encode(&claims, &secret).map_err(|e| {
            tracing::error!(target: "secret_ring.token", error = %e, "Token encoding failed");
            record_token_signing("error");
            KeyringError::Signing(e.to_string())
        })?;

        tracing::debug!(
            target: "secret_ring.token",
            sequence = secret.sequence(),
            exp = claims.exp,
            "Token signed"
        );
        record_token_signing("success");

        Ok(token)
    }

    /// Verify `token` against every active secret and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::TokenInvalid` if the token is oversized,
    /// malformed, expired, or not signed by any secret still in the ring.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "secret_ring.token",
                token_size = token.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            record_token_verification("error", 0);
            return Err(KeyringError::TokenInvalid);
        }

        // One snapshot for the whole loop.
        let secrets = self.ring.active_secrets();

        for (index, secret) in secrets.iter().enumerate() {
            match self.codec.decode(token, secret) {
                Ok(claims) => {
                    tracing::debug!(
                        target: "secret_ring.token",
                        sequence = secret.sequence(),
                        attempts = index + 1,
                        "Token verified"
                    );
                    record_token_verification("success", index + 1);
                    return Ok(claims);
                }
                Err(e) => {
                    tracing::debug!(
                        target: "secret_ring.token",
                        sequence = secret.sequence(),
                        error = %e,
                        "Token rejected under secret"
                    );
                }
            }
        }

        tracing::debug!(
            target: "secret_ring.token",
            tried = secrets.len(),
            "Token rejected under every active secret"
        );
        record_token_verification("error", secrets.len());
        Err(KeyringError::TokenInvalid)
    }

    /// The ring this service signs and verifies with.
    #[must_use]
    pub fn ring(&self) -> &Arc<SecretRing> {
        &self.ring
    }

    /// Validity window stamped into each token.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ring", &self.ring)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use crate::jwt::CodecError;
    use crate::secret::Secret;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn service(capacity: usize) -> TokenService {
        let ring = Arc::new(SecretRing::new(&RingConfig {
            capacity,
            secret_byte_length: 32,
        }));
        TokenService::new(ring, Arc::new(JwtCodec::new()), Duration::from_secs(300))
    }

    /// Wraps JwtCodec and counts decode attempts.
    struct CountingCodec {
        inner: JwtCodec,
        decodes: AtomicUsize,
    }

    impl TokenCodec for CountingCodec {
        fn encode(
            &self,
            claims: &TokenClaims,
            secret: &Secret,
        ) -> std::result::Result<String, CodecError> {
            self.inner.encode(claims, secret)
        }

        fn decode(
            &self,
            token: &str,
            secret: &Secret,
        ) -> std::result::Result<TokenClaims, CodecError> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            self.inner.decode(token, secret)
        }
    }

    struct BrokenEncoder;

    impl TokenCodec for BrokenEncoder {
        fn encode(&self, _: &TokenClaims, _: &Secret) -> std::result::Result<String, CodecError> {
            Err(CodecError::Encode("backend offline".to_string()))
        }

        fn decode(&self, _: &str, _: &Secret) -> std::result::Result<TokenClaims, CodecError> {
            Err(CodecError::Decode("backend offline".to_string()))
        }
    }

    #[test]
    fn test_sign_before_rotation_fails() {
        let service = service(2);
        let err = service.sign(&payload(json!({"userId": 123}))).unwrap_err();
        assert_eq!(err, KeyringError::NoActiveSecret);
    }

    #[test]
    fn test_verify_on_empty_ring_is_invalid() {
        let service = service(2);
        assert_eq!(
            service.verify("a.b.c").unwrap_err(),
            KeyringError::TokenInvalid
        );
    }

    #[test]
    fn test_sign_then_verify_returns_payload() {
        let service = service(2);
        service.ring().rotate().unwrap();

        let signed = payload(json!({"userId": 123, "role": "admin"}));
        let token = service.sign(&signed).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.payload, signed);
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_ttl_is_applied_to_exp() {
        let ring = Arc::new(SecretRing::new(&RingConfig::default()));
        ring.rotate().unwrap();
        let service = TokenService::new(ring, Arc::new(JwtCodec::new()), Duration::from_secs(42));

        let issued_at = Utc::now();
        let token = service.sign_at(&Payload::new(), issued_at).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(claims.exp, issued_at.timestamp() + 42);
    }

    #[test]
    fn test_expired_token_is_invalid_while_secret_active() {
        let service = service(2);
        service.ring().rotate().unwrap();

        let issued_at = Utc::now() - chrono::Duration::minutes(10);
        let token = service
            .sign_at(&payload(json!({"userId": 123})), issued_at)
            .unwrap();

        assert_eq!(service.ring().len(), 1);
        assert_eq!(service.verify(&token).unwrap_err(), KeyringError::TokenInvalid);
    }

    #[test]
    fn test_token_valid_until_its_secret_is_evicted() {
        let service = service(2);
        service.ring().rotate().unwrap();
        let token = service.sign(&payload(json!({"userId": 123}))).unwrap();

        service.ring().rotate().unwrap();
        assert!(service.verify(&token).is_ok(), "older secret still active");

        service.ring().rotate().unwrap();
        assert_eq!(service.verify(&token).unwrap_err(), KeyringError::TokenInvalid);
    }

    #[test]
    fn test_new_tokens_use_newest_secret() {
        let ring = Arc::new(SecretRing::new(&RingConfig::default()));
        let codec = Arc::new(CountingCodec {
            inner: JwtCodec::new(),
            decodes: AtomicUsize::new(0),
        });
        let service = TokenService::new(
            Arc::clone(&ring),
            Arc::clone(&codec) as Arc<dyn TokenCodec>,
            Duration::from_secs(300),
        );

        ring.rotate().unwrap();
        let old_token = service.sign(&Payload::new()).unwrap();
        ring.rotate().unwrap();
        let new_token = service.sign(&Payload::new()).unwrap();

        // Newest-first: the fresh token needs one attempt, the older one two.
        service.verify(&new_token).unwrap();
        assert_eq!(codec.decodes.swap(0, Ordering::SeqCst), 1);

        service.verify(&old_token).unwrap();
        assert_eq!(codec.decodes.swap(0, Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reserved_claims_rejected() {
        let service = service(2);
        service.ring().rotate().unwrap();

        for name in RESERVED_CLAIMS {
            let mut claims = Payload::new();
            claims.insert(name.to_string(), json!(0));
            let err = service.sign(&claims).unwrap_err();
            assert_eq!(err, KeyringError::ReservedClaim(name.to_string()));
        }
    }

    #[test]
    fn test_oversized_token_is_invalid_without_decoding() {
        let ring = Arc::new(SecretRing::new(&RingConfig::default()));
        ring.rotate().unwrap();
        let codec = Arc::new(CountingCodec {
            inner: JwtCodec::new(),
            decodes: AtomicUsize::new(0),
        });
        let service = TokenService::new(
            ring,
            Arc::clone(&codec) as Arc<dyn TokenCodec>,
            Duration::from_secs(300),
        );

        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert_eq!(service.verify(&oversized).unwrap_err(), KeyringError::TokenInvalid);
        assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let service = service(2);
        service.ring().rotate().unwrap();

        for token in ["", "garbage", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30.AAAA"] {
            assert_eq!(
                service.verify(token).unwrap_err(),
                KeyringError::TokenInvalid,
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_token_from_other_ring_is_invalid() {
        let issuer = service(2);
        let verifier = service(2);
        issuer.ring().rotate().unwrap();
        verifier.ring().rotate().unwrap();

        let token = issuer.sign(&payload(json!({"userId": 1}))).unwrap();
        assert_eq!(verifier.verify(&token).unwrap_err(), KeyringError::TokenInvalid);
    }

    #[test]
    fn test_codec_failure_maps_to_signing_error() {
        let ring = Arc::new(SecretRing::new(&RingConfig::default()));
        ring.rotate().unwrap();
        let service = TokenService::new(ring, Arc::new(BrokenEncoder), Duration::from_secs(300));

        let err = service.sign(&Payload::new()).unwrap_err();
        assert!(matches!(err, KeyringError::Signing(msg) if msg.contains("backend offline")));
    }

    #[test]
    fn test_from_config_uses_configured_ttl() {
        let config = KeyringConfig {
            token_ttl: Duration::from_secs(120),
            ..KeyringConfig::default()
        };
        let ring = Arc::new(SecretRing::new(&config.ring));
        let service = TokenService::from_config(ring, &config);

        assert_eq!(service.token_ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_service_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokenService>();
    }
}
