//! Observability helpers for the secret ring.
//!
//! # Privacy by Default
//!
//! Public operations use `#[instrument(skip_all)]` and log only allow-listed
//! fields:
//! - **SAFE**: sequence numbers, counts, durations, outcome labels
//! - **HASHED**: secret material, via [`fingerprint`]
//! - **NEVER**: raw secret bytes, token strings, claim values

pub mod metrics;

pub use metrics::{
    record_rotation, record_token_signing, record_token_verification, set_active_secrets,
};

use sha2::{Digest, Sha256};

/// Hash secret material for correlation in logs (SHA-256, first 8 hex chars).
///
/// Enough to tell two secrets apart across log lines. Not enough to recover
/// or brute-force a 256-bit secret.
#[must_use]
pub fn fingerprint(material: &[u8]) -> String {
    let digest = Sha256::digest(material);
    hex::encode(digest.get(..4).unwrap_or_default())
}
