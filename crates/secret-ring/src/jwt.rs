//! JWT encoding and decoding for tokens signed with ring secrets.
//!
//! This module provides:
//! - The [`TokenCodec`] seam between the token service and a wire format
//! - [`JwtCodec`], an HS256 JWT implementation of that seam
//! - [`TokenClaims`], the caller payload plus `iat`/`exp`
//! - Size and reserved-claim constants
//!
//! # Security
//!
//! - Only HS256 is accepted on decode; a token whose header names any other
//!   algorithm (including `none`) is rejected
//! - `exp` is validated with zero leeway
//! - No `kid` header is written; the verifier finds the secret by trial
//! - Claim values are never printed by `Debug`

use crate::secret::{ExposeSecret, Secret};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// Tokens larger than this are rejected before any base64 decoding or HMAC
/// work, so an oversized token costs one length comparison. Typical tokens
/// here are 150-400 bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Claim names owned by the token format. A payload may not set these.
pub const RESERVED_CLAIMS: [&str; 2] = ["iat", "exp"];

/// Caller-supplied claims: any JSON object.
pub type Payload = Map<String, Value>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from a [`TokenCodec`].
///
/// These stay inside the crate boundary: the token service logs them at
/// debug level and surfaces only its own opaque error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Token encoding failed: {0}")]
    Encode(String),

    #[error("Token decoding failed: {0}")]
    Decode(String),
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by a signed token.
///
/// The payload is flattened into the top-level JSON object next to `iat`
/// and `exp`, so `{"userId": 123}` signed at t=1000 with a 300s TTL encodes
/// as `{"iat":1000,"exp":1300,"userId":123}`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Caller payload.
    #[serde(flatten)]
    pub payload: Payload,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&String> = self.payload.keys().collect();
        f.debug_struct("TokenClaims")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("payload_keys", &keys)
            .finish()
    }
}

impl TokenClaims {
    #[must_use]
    pub fn new(payload: Payload, iat: i64, exp: i64) -> Self {
        Self { iat, exp, payload }
    }

    /// Look up a payload claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Signs claims with a secret and verifies tokens against a secret.
///
/// Implementations must be pure functions of their inputs: the ring decides
/// which secret to use, the codec only applies it.
pub trait TokenCodec: Send + Sync {
    /// Produce a token binding `claims` to `secret`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Encode` if the claims cannot be serialized or signed.
    fn encode(&self, claims: &TokenClaims, secret: &Secret) -> Result<String, CodecError>;

    /// Check `token` against `secret` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` if the token is malformed, was not signed
    /// with `secret`, or has expired.
    fn decode(&self, token: &str, secret: &Secret) -> Result<TokenClaims, CodecError>;
}

/// HS256 JWT codec.
#[derive(Debug, Clone)]
pub struct JwtCodec {
    validation: Validation,
}

impl Default for JwtCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JwtCodec {
    #[must_use]
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        // Payloads may legitimately carry an `aud`; audience is not ours to check.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self { validation }
    }
}

impl TokenCodec for JwtCodec {
    fn encode(&self, claims: &TokenClaims, secret: &Secret) -> Result<String, CodecError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let encoding_key = EncodingKey::from_secret(secret.expose_secret());

        encode(&header, claims, &encoding_key).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, token: &str, secret: &Secret) -> Result<TokenClaims, CodecError> {
        let decoding_key = DecodingKey::from_secret(secret.expose_secret());

        decode::<TokenClaims>(token, &decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| CodecError::Decode(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::Utc;
    use serde_json::json;

    fn secret(byte: u8, sequence: u64) -> Secret {
        Secret::new(sequence, Utc::now(), vec![byte; 32])
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn live_claims() -> TokenClaims {
        let now = Utc::now().timestamp();
        TokenClaims::new(payload(json!({"userId": 123, "role": "admin"})), now, now + 300)
    }

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_token_size_is_8kb() {
        assert_eq!(MAX_TOKEN_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_reserved_claims() {
        assert_eq!(RESERVED_CLAIMS, ["iat", "exp"]);
    }

    // -------------------------------------------------------------------------
    // TokenClaims Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_claims_payload_is_flattened() {
        let claims = TokenClaims::new(payload(json!({"userId": 123})), 1000, 1300);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json, json!({"iat": 1000, "exp": 1300, "userId": 123}));
    }

    #[test]
    fn test_claims_deserialize_splits_registered_claims() {
        let claims: TokenClaims =
            serde_json::from_value(json!({"iat": 1, "exp": 2, "role": "admin"})).unwrap();

        assert_eq!(claims.iat, 1);
        assert_eq!(claims.exp, 2);
        assert_eq!(claims.payload, payload(json!({"role": "admin"})));
        assert_eq!(claims.get("role"), Some(&json!("admin")));
        assert!(claims.get("iat").is_none());
    }

    #[test]
    fn test_claims_debug_hides_values() {
        let claims = TokenClaims::new(payload(json!({"email": "alice@example.com"})), 1, 2);
        let debug_str = format!("{claims:?}");

        assert!(debug_str.contains("email"));
        assert!(!debug_str.contains("alice@example.com"));
    }

    // -------------------------------------------------------------------------
    // JwtCodec Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_encode_decode_same_secret() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let claims = live_claims();

        let token = codec.encode(&claims, &secret).unwrap();
        let decoded = codec.decode(&token, &secret).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_header_is_hs256_without_kid() {
        let codec = JwtCodec::new();
        let token = codec.encode(&live_claims(), &secret(1, 1)).unwrap();

        let header_b64 = token.split('.').next().unwrap();
        let header: Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).unwrap()).unwrap();

        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
        assert!(header.get("kid").is_none());
    }

    #[test]
    fn test_decode_with_wrong_secret_fails() {
        let codec = JwtCodec::new();
        let token = codec.encode(&live_claims(), &secret(1, 1)).unwrap();

        let result = codec.decode(&token, &secret(2, 2));
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_expired_token_fails() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let now = Utc::now().timestamp();
        let claims = TokenClaims::new(payload(json!({"userId": 1})), now - 600, now - 300);

        let token = codec.encode(&claims, &secret).unwrap();
        assert!(codec.decode(&token, &secret).is_err());
    }

    #[test]
    fn test_decode_just_expired_token_fails_without_leeway() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let now = Utc::now().timestamp();
        // Inside the 60s leeway jsonwebtoken would apply by default
        let claims = TokenClaims::new(Payload::new(), now - 310, now - 10);

        let token = codec.encode(&claims, &secret).unwrap();
        assert!(codec.decode(&token, &secret).is_err());
    }

    #[test]
    fn test_decode_tampered_payload_fails() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let token = codec.encode(&live_claims(), &secret).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let now = Utc::now().timestamp();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&json!({"iat": now, "exp": now + 300, "userId": 1, "role": "root"}))
                .unwrap(),
        );
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(codec.decode(&tampered, &secret).is_err());
    }

    #[test]
    fn test_decode_rejects_alg_none() {
        let codec = JwtCodec::new();
        let now = Utc::now().timestamp();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&json!({"iat": now, "exp": now + 300})).unwrap());
        let token = format!("{header}.{body}.");

        assert!(codec.decode(&token, &secret(1, 1)).is_err());
    }

    #[test]
    fn test_decode_rejects_other_hmac_algorithm() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let token = encode(
            &Header::new(Algorithm::HS512),
            &live_claims(),
            &EncodingKey::from_secret(secret.expose_secret()),
        )
        .unwrap();

        assert!(codec.decode(&token, &secret).is_err());
    }

    #[test]
    fn test_decode_malformed_token_fails() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);

        for token in ["", "not-a-jwt", "a.b", "a.b.c", "!!!.???.***"] {
            assert!(codec.decode(token, &secret).is_err(), "{token:?} should fail");
        }
    }

    #[test]
    fn test_decode_missing_iat_fails() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"exp": now + 300, "userId": 1}),
            &EncodingKey::from_secret(secret.expose_secret()),
        )
        .unwrap();

        assert!(codec.decode(&token, &secret).is_err());
    }

    #[test]
    fn test_payload_with_audience_is_accepted() {
        let codec = JwtCodec::new();
        let secret = secret(1, 1);
        let now = Utc::now().timestamp();
        let claims = TokenClaims::new(payload(json!({"aud": "billing"})), now, now + 300);

        let token = codec.encode(&claims, &secret).unwrap();
        let decoded = codec.decode(&token, &secret).unwrap();
        assert_eq!(decoded.get("aud"), Some(&json!("billing")));
    }
}
