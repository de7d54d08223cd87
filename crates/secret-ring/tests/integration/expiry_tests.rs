//! Expiry tests against the wall clock
//!
//! Expiry is checked with zero leeway. These tests use short TTLs and real
//! sleeps; exact boundaries are covered by the unit tests.

use secret_ring::KeyringError;
use secret_ring_test_utils::{test_service, TestPayloadBuilder, TokenAssertions};
use std::time::Duration;

#[test]
fn test_token_expires_while_secret_still_active() -> Result<(), anyhow::Error> {
    let service = test_service(2, 1);
    service.ring().rotate()?;

    let token = service.sign(&TestPayloadBuilder::new().for_user(123).build())?;
    token.assert_expires_in(1);
    assert!(service.verify(&token).is_ok());

    std::thread::sleep(Duration::from_millis(2100));

    assert_eq!(service.ring().len(), 1, "no rotation happened");
    assert_eq!(service.verify(&token), Err(KeyringError::TokenInvalid));

    Ok(())
}

#[test]
fn test_token_lifetime_matches_configured_ttl() -> Result<(), anyhow::Error> {
    for ttl in [1, 60, 300, 86_400] {
        let service = test_service(2, ttl);
        service.ring().rotate()?;

        let token = service.sign(&TestPayloadBuilder::new().build())?;
        token.assert_valid_jwt().assert_expires_in(i64::try_from(ttl)?);
    }

    Ok(())
}
