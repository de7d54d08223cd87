//! Custom test assertions for expressive tests
//!
//! Inspect the token's encoded form without verifying its signature, so
//! tests can check structure independently of ring state.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::{Map, Value};

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

fn decode_part(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing part {index}"));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT part {index}: {e}"))
}

fn decode_claims(token: &str) -> Map<String, Value> {
    serde_json::from_slice(&decode_part(token, 1)).expect("Failed to parse JWT claims JSON")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_has_claim("role", "admin")
///     .assert_expires_in(300);
/// ```
pub trait TokenAssertions {
    /// Assert the token is a three-part HS256 JWT with `iat` and `exp`
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the payload carries `name` with the given value
    fn assert_has_claim(&self, name: &str, expected: impl Into<Value>) -> &Self;

    /// Assert `exp - iat` equals `seconds`
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: JwtHeader = serde_json::from_slice(&decode_part(self, 0))
            .expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");
        assert!(header.kid.is_none(), "Tokens must not carry a key id");

        let claims = decode_claims(self);
        assert!(
            claims.get("iat").is_some_and(Value::is_i64),
            "JWT must carry a numeric iat"
        );
        assert!(
            claims.get("exp").is_some_and(Value::is_i64),
            "JWT must carry a numeric exp"
        );

        self
    }

    fn assert_has_claim(&self, name: &str, expected: impl Into<Value>) -> &Self {
        let claims = decode_claims(self);
        let expected = expected.into();
        assert_eq!(
            claims.get(name),
            Some(&expected),
            "Claim '{name}' mismatch. Available claims: {:?}",
            claims.keys().collect::<Vec<_>>()
        );

        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = decode_claims(self);
        let iat = claims.get("iat").and_then(Value::as_i64).expect("iat");
        let exp = claims.get("exp").and_then(Value::as_i64).expect("exp");
        assert_eq!(
            exp - iat,
            seconds,
            "Token lifetime should be {seconds}s, got {}s",
            exp - iat
        );

        self
    }
}
