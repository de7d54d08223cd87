//! Rotation window tests
//!
//! A token stays verifiable for exactly as long as the secret that signed it
//! remains in the ring: through `capacity - 1` further rotations, and no
//! longer.

use secret_ring::entropy::EntropySource;
use secret_ring::jwt::JwtCodec;
use secret_ring::token_service::TokenService;
use secret_ring::KeyringError;
use secret_ring_test_utils::{
    test_ring_with_entropy, test_service, SequenceEntropy, SwitchableEntropy, TestPayloadBuilder,
};
use std::sync::Arc;
use std::time::Duration;

/// The two-secret walkthrough:
/// 1. Rotate in S1 and issue T1
/// 2. Rotate in S2: T1 still verifies, new tokens use S2
/// 3. Rotate in S3: S1 is evicted, T1 fails, T2 still verifies
#[test]
fn test_two_secret_rotation_window() -> Result<(), anyhow::Error> {
    let service = test_service(2, 300);
    let payload = TestPayloadBuilder::new()
        .for_user(123)
        .with_role("admin")
        .build();

    service.ring().rotate()?;
    let t1 = service.sign(&payload)?;
    assert_eq!(service.verify(&t1)?.payload, payload);

    service.ring().rotate()?;
    assert!(service.verify(&t1).is_ok(), "T1 valid while S1 is active");
    let t2 = service.sign(&payload)?;
    assert_ne!(t1, t2, "T2 must be signed with S2");
    assert!(service.verify(&t2).is_ok());

    service.ring().rotate()?;
    assert_eq!(service.verify(&t1), Err(KeyringError::TokenInvalid));
    assert!(service.verify(&t2).is_ok(), "T2 valid while S2 is active");

    Ok(())
}

#[test]
fn test_capacity_one_invalidates_on_every_rotation() -> Result<(), anyhow::Error> {
    let service = test_service(1, 300);
    service.ring().rotate()?;
    let token = service.sign(&TestPayloadBuilder::new().for_user(1).build())?;
    assert!(service.verify(&token).is_ok());

    service.ring().rotate()?;
    assert_eq!(service.verify(&token), Err(KeyringError::TokenInvalid));

    Ok(())
}

#[test]
fn test_window_scales_with_capacity() -> Result<(), anyhow::Error> {
    for capacity in 1..=5 {
        let service = test_service(capacity, 300);
        service.ring().rotate()?;
        let token = service.sign(&TestPayloadBuilder::new().for_user(7).build())?;

        for rotation in 1..capacity {
            service.ring().rotate()?;
            assert!(
                service.verify(&token).is_ok(),
                "capacity {capacity}: token should survive rotation {rotation}"
            );
        }

        service.ring().rotate()?;
        assert_eq!(
            service.verify(&token),
            Err(KeyringError::TokenInvalid),
            "capacity {capacity}: token should fail after {capacity} rotations"
        );
        assert_eq!(service.ring().len(), capacity);
    }

    Ok(())
}

#[test]
fn test_failed_rotation_keeps_existing_tokens_valid() -> Result<(), anyhow::Error> {
    let entropy = Arc::new(SwitchableEntropy::default());
    let ring = test_ring_with_entropy(2, Arc::clone(&entropy) as Arc<dyn EntropySource>);
    let service = TokenService::new(
        Arc::clone(&ring),
        Arc::new(JwtCodec::new()),
        Duration::from_secs(300),
    );

    ring.rotate()?;
    let token = service.sign(&TestPayloadBuilder::new().for_user(5).build())?;

    entropy.set_failing(true);
    for _ in 0..3 {
        assert!(matches!(
            ring.rotate(),
            Err(KeyringError::EntropySourceUnavailable(_))
        ));
    }

    assert_eq!(ring.len(), 1);
    assert_eq!(ring.current()?.sequence(), 1);
    assert!(service.verify(&token).is_ok());

    entropy.set_failing(false);
    assert_eq!(ring.rotate()?.sequence(), 2);

    Ok(())
}

#[test]
fn test_same_material_produces_interchangeable_tokens() -> Result<(), anyhow::Error> {
    // Rings share no state; identical entropy yields identical secrets.
    let issuer_ring = test_ring_with_entropy(2, Arc::new(SequenceEntropy::starting_at(9)));
    let verifier_ring = test_ring_with_entropy(2, Arc::new(SequenceEntropy::starting_at(9)));
    issuer_ring.rotate()?;
    verifier_ring.rotate()?;

    let issuer = TokenService::new(issuer_ring, Arc::new(JwtCodec::new()), Duration::from_secs(60));
    let verifier =
        TokenService::new(verifier_ring, Arc::new(JwtCodec::new()), Duration::from_secs(60));

    let token = issuer.sign(&TestPayloadBuilder::new().for_user(1).build())?;
    assert!(verifier.verify(&token).is_ok());

    Ok(())
}
