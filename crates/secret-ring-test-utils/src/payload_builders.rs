//! Builder patterns for test payload construction

use secret_ring::jwt::Payload;
use serde_json::Value;

/// Builder for token payloads
///
/// # Example
/// ```rust,ignore
/// let payload = TestPayloadBuilder::new()
///     .for_user(123)
///     .with_role("admin")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct TestPayloadBuilder {
    claims: Payload,
}

impl TestPayloadBuilder {
    /// Start from an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `userId` claim
    pub fn for_user(self, user_id: u64) -> Self {
        self.with_claim("userId", user_id)
    }

    /// Set the `role` claim
    pub fn with_role(self, role: &str) -> Self {
        self.with_claim("role", role)
    }

    /// Set an arbitrary claim, including reserved ones for negative tests.
    pub fn with_claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    /// Pad the payload with a filler claim of `len` characters.
    pub fn with_padding(self, len: usize) -> Self {
        self.with_claim("padding", "x".repeat(len))
    }

    pub fn build(self) -> Payload {
        self.claims
    }
}
