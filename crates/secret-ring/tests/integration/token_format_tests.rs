//! Token format and rejection tests

use secret_ring::jwt::MAX_TOKEN_SIZE_BYTES;
use secret_ring::KeyringError;
use secret_ring_test_utils::{test_service, TestPayloadBuilder, TokenAssertions};

#[test]
fn test_issued_token_is_hs256_jwt_with_payload() -> Result<(), anyhow::Error> {
    let service = test_service(2, 300);
    service.ring().rotate()?;

    let payload = TestPayloadBuilder::new()
        .for_user(123)
        .with_role("admin")
        .build();
    let token = service.sign(&payload)?;

    token
        .assert_valid_jwt()
        .assert_has_claim("userId", 123)
        .assert_has_claim("role", "admin")
        .assert_expires_in(300);

    let claims = service.verify(&token)?;
    assert_eq!(claims.get("role"), payload.get("role"));

    Ok(())
}

#[test]
fn test_reserved_claims_cannot_be_overridden() -> Result<(), anyhow::Error> {
    let service = test_service(2, 300);
    service.ring().rotate()?;

    let payload = TestPayloadBuilder::new()
        .for_user(1)
        .with_claim("exp", 4_102_444_800_i64)
        .build();

    assert_eq!(
        service.sign(&payload),
        Err(KeyringError::ReservedClaim("exp".to_string()))
    );

    Ok(())
}

#[test]
fn test_oversized_token_is_rejected() -> Result<(), anyhow::Error> {
    let service = test_service(2, 300);
    service.ring().rotate()?;

    // Signing has no size limit; verification does.
    let payload = TestPayloadBuilder::new()
        .with_padding(MAX_TOKEN_SIZE_BYTES)
        .build();
    let token = service.sign(&payload)?;
    assert!(token.len() > MAX_TOKEN_SIZE_BYTES);

    assert_eq!(service.verify(&token), Err(KeyringError::TokenInvalid));

    Ok(())
}

#[test]
fn test_spliced_payload_is_rejected() -> Result<(), anyhow::Error> {
    let service = test_service(2, 300);
    service.ring().rotate()?;

    let user = service.sign(&TestPayloadBuilder::new().with_role("user").build())?;
    let admin = service.sign(&TestPayloadBuilder::new().with_role("admin").build())?;

    let user_parts: Vec<&str> = user.split('.').collect();
    let admin_parts: Vec<&str> = admin.split('.').collect();
    let spliced = format!(
        "{}.{}.{}",
        user_parts.first().copied().unwrap_or_default(),
        admin_parts.get(1).copied().unwrap_or_default(),
        user_parts.get(2).copied().unwrap_or_default()
    );

    assert_eq!(service.verify(&spliced), Err(KeyringError::TokenInvalid));

    Ok(())
}

#[test]
fn test_every_failure_has_the_same_message() -> Result<(), anyhow::Error> {
    let service = test_service(1, 300);
    service.ring().rotate()?;
    let evicted = service.sign(&TestPayloadBuilder::new().build())?;
    service.ring().rotate()?;

    let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
    let messages: Vec<String> = ["not-a-token", evicted.as_str(), oversized.as_str()]
        .into_iter()
        .map(|token| match service.verify(token) {
            Ok(_) => "verified".to_string(),
            Err(e) => e.to_string(),
        })
        .collect();

    for message in &messages {
        assert_eq!(message, "The access token is invalid or expired");
    }

    Ok(())
}
