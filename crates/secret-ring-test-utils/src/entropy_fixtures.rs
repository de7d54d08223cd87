//! Deterministic entropy sources and ring fixtures
//!
//! Every [`SequenceEntropy`] fill produces a different but reproducible
//! pattern, so consecutive rotations never collide and tests can still
//! predict secret material.

use secret_ring::config::RingConfig;
use secret_ring::entropy::{EntropyError, EntropySource};
use secret_ring::jwt::JwtCodec;
use secret_ring::ring::SecretRing;
use secret_ring::token_service::TokenService;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fills with `seed, seed+1, ...`, bumping the seed on every call.
#[derive(Debug, Default)]
pub struct SequenceEntropy {
    next_seed: AtomicU8,
}

impl SequenceEntropy {
    /// Start at the given seed.
    pub fn starting_at(seed: u8) -> Self {
        Self {
            next_seed: AtomicU8::new(seed),
        }
    }

    /// The bytes the `n`th fill (0-based) of `len` bytes produces when
    /// starting from `seed`.
    pub fn expected_fill(seed: u8, n: u8, len: usize) -> Vec<u8> {
        let start = seed.wrapping_add(n);
        (0..len)
            .map(|i| start.wrapping_add(i as u8))
            .collect()
    }
}

impl EntropySource for SequenceEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let start = self.next_seed.fetch_add(1, Ordering::SeqCst);
        for (i, byte) in dest.iter_mut().enumerate() {
            *byte = start.wrapping_add(i as u8);
        }
        Ok(())
    }
}

/// Always fails, like an exhausted or unavailable OS RNG.
#[derive(Debug, Default)]
pub struct FailingEntropy;

impl EntropySource for FailingEntropy {
    fn fill(&self, _dest: &mut [u8]) -> Result<(), EntropyError> {
        Err(EntropyError("test entropy source is unavailable".to_string()))
    }
}

/// Delegates to [`SequenceEntropy`] until switched into failure mode.
#[derive(Debug, Default)]
pub struct SwitchableEntropy {
    inner: SequenceEntropy,
    failing: AtomicBool,
}

impl SwitchableEntropy {
    /// Make subsequent fills fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl EntropySource for SwitchableEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        if self.failing.load(Ordering::SeqCst) {
            return FailingEntropy.fill(dest);
        }
        self.inner.fill(dest)
    }
}

/// Ring of the given capacity holding 32-byte secrets from the OS RNG.
pub fn test_ring(capacity: usize) -> Arc<SecretRing> {
    let config = RingConfig::new(capacity, 32).expect("test ring capacity must be valid");
    Arc::new(SecretRing::new(&config))
}

/// Ring of the given capacity drawing from `entropy`.
pub fn test_ring_with_entropy(capacity: usize, entropy: Arc<dyn EntropySource>) -> Arc<SecretRing> {
    let config = RingConfig::new(capacity, 32).expect("test ring capacity must be valid");
    Arc::new(SecretRing::with_entropy(&config, entropy))
}

/// HS256 token service over a fresh, empty ring.
pub fn test_service(capacity: usize, ttl_seconds: u64) -> TokenService {
    TokenService::new(
        test_ring(capacity),
        Arc::new(JwtCodec::new()),
        Duration::from_secs(ttl_seconds),
    )
}
