//! Bounded, ordered history of signing secrets.
//!
//! The ring holds at most `capacity` secrets. [`SecretRing::rotate`] appends a
//! freshly generated secret and evicts the oldest ones in the same critical
//! section, so no reader ever observes more than `capacity` secrets or a ring
//! that is half-way through a rotation.
//!
//! # Concurrency
//!
//! A single mutex guards the secrets and the sequence counter. Only cheap
//! work happens under it (push, pop, clone of reference-counted secrets).
//! Entropy is drawn before the lock is taken, and callers sign or verify on
//! the copies they got back, after the lock is released.
//!
//! # Capacity of one
//!
//! With `capacity == 1` every rotation is destructive: tokens signed under
//! the previous secret stop verifying immediately. This is allowed on
//! purpose for deployments that prefer hard cut-over.

use crate::config::RingConfig;
use crate::entropy::{EntropySource, SystemEntropy};
use crate::error::{KeyringError, Result};
use crate::observability::{record_rotation, set_active_secrets};
use crate::secret::Secret;
use chrono::Utc;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::instrument;

/// Secrets plus the counter that orders them. Always mutated together.
struct RingState {
    /// Oldest at the front, newest at the back.
    secrets: VecDeque<Secret>,
    next_sequence: u64,
}

/// Bounded store of active signing secrets.
///
/// Construct one per token-issuing component and share it via `Arc`. There
/// is no process-wide instance.
pub struct SecretRing {
    capacity: usize,
    secret_byte_length: usize,
    entropy: Arc<dyn EntropySource>,
    state: Mutex<RingState>,
}

impl SecretRing {
    /// Create an empty ring backed by the operating system CSPRNG.
    #[must_use]
    pub fn new(config: &RingConfig) -> Self {
        Self::with_entropy(config, Arc::new(SystemEntropy::new()))
    }

    /// Create an empty ring with a caller-supplied entropy source.
    #[must_use]
    pub fn with_entropy(config: &RingConfig, entropy: Arc<dyn EntropySource>) -> Self {
        // RingConfig::new already rejects zero; this guards hand-built configs.
        let capacity = config.capacity.max(1);

        Self {
            capacity,
            secret_byte_length: config.secret_byte_length,
            entropy,
            state: Mutex::new(RingState {
                secrets: VecDeque::with_capacity(capacity + 1),
                next_sequence: 1,
            }),
        }
    }

    /// Generate a new secret, make it the signing secret, and evict the
    /// oldest secrets beyond capacity.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::EntropySourceUnavailable` if random bytes could
    /// not be drawn. The ring is left exactly as it was.
    #[instrument(skip_all)]
    pub fn rotate(&self) -> Result<Secret> {
        let mut material = vec![0u8; self.secret_byte_length];
        if let Err(e) = self.entropy.fill(&mut material) {
            tracing::error!(target: "secret_ring.ring", error = %e, "Rotation aborted: entropy source unavailable");
            record_rotation("error");
            return Err(KeyringError::EntropySourceUnavailable(e.0));
        }

        let (secret, evicted, active) = {
            let mut state = self.lock();

            let sequence = state.next_sequence;
            state.next_sequence += 1;

            let secret = Secret::new(sequence, Utc::now(), material);
            state.secrets.push_back(secret.clone());

            let mut evicted = Vec::new();
            while state.secrets.len() > self.capacity {
                if let Some(old) = state.secrets.pop_front() {
                    evicted.push(old.sequence());
                }
            }

            (secret, evicted, state.secrets.len())
        };

        tracing::info!(
            target: "secret_ring.ring",
            sequence = secret.sequence(),
            fingerprint = %secret.fingerprint(),
            evicted = ?evicted,
            active = active,
            "Signing secret rotated"
        );
        record_rotation("success");
        set_active_secrets(active);

        Ok(secret)
    }

    /// The newest secret, used for signing.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::NoActiveSecret` before the first rotation.
    pub fn current(&self) -> Result<Secret> {
        self.lock()
            .secrets
            .back()
            .cloned()
            .ok_or(KeyringError::NoActiveSecret)
    }

    /// Snapshot of every retained secret, newest first.
    ///
    /// The returned vector is a copy; later rotations do not change it.
    #[must_use]
    pub fn active_secrets(&self) -> Vec<Secret> {
        self.lock().secrets.iter().rev().cloned().collect()
    }

    /// Number of secrets currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().secrets.len()
    }

    /// `true` until the first successful rotation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().secrets.is_empty()
    }

    /// Maximum number of secrets retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Critical sections never leave RingState half-updated, so a poisoned
    // lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SecretRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let sequences: Vec<u64> = state.secrets.iter().map(Secret::sequence).collect();
        f.debug_struct("SecretRing")
            .field("capacity", &self.capacity)
            .field("secret_byte_length", &self.secret_byte_length)
            .field("sequences", &sequences)
            .finish_non_exhaustive()
    }
}
