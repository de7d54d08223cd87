//! Signing secrets and types that keep them out of logs.
//!
//! Key material is held in a [`secrecy::SecretBox`], so any struct deriving
//! `Debug` around it prints `[REDACTED]` instead of bytes, and the buffer is
//! zeroized when the last copy is dropped.
//!
//! A [`Secret`] is only ever created by
//! [`SecretRing::rotate`](crate::ring::SecretRing::rotate) and is immutable
//! afterwards. Cloning is cheap: clones share one reference-counted buffer,
//! which is what lets the ring hand out snapshots without holding its lock
//! during cryptographic work.
//!
//! ```rust,ignore
//! use secret_ring::secret::ExposeSecret;
//!
//! let secret = ring.current()?;
//! println!("{secret:?}"); // Secret { sequence: 3, .., material: "[REDACTED]" }
//! let key: &[u8] = secret.expose_secret();
//! ```

use crate::observability::fingerprint;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// One symmetric signing secret held by the ring.
///
/// Identity and ordering come from `sequence`, which the ring assigns in
/// strictly increasing order. `created_at` is informational only: two
/// rotations inside one clock tick get the same timestamp but distinct
/// sequence numbers.
#[derive(Clone)]
pub struct Secret {
    sequence: u64,
    created_at: DateTime<Utc>,
    fingerprint: String,
    material: Arc<SecretBox<Vec<u8>>>,
}

impl Secret {
    pub(crate) fn new(sequence: u64, created_at: DateTime<Utc>, material: Vec<u8>) -> Self {
        let fingerprint = fingerprint(&material);
        Self {
            sequence,
            created_at,
            fingerprint,
            material: Arc::new(SecretBox::new(Box::new(material))),
        }
    }

    /// Position of this secret in the ring's insertion order (starts at 1).
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time the secret was inserted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Short, non-reversible identifier safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Length of the key material in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.material.expose_secret().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.material.expose_secret().is_empty()
    }
}

impl ExposeSecret<[u8]> for Secret {
    fn expose_secret(&self) -> &[u8] {
        self.material.expose_secret().as_slice()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("sequence", &self.sequence)
            .field("created_at", &self.created_at)
            .field("fingerprint", &self.fingerprint)
            .field("material", &"[REDACTED]")
            .finish()
    }
}
