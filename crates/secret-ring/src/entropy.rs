//! Random byte source for secret generation.
//!
//! Rotation never falls back to a weaker generator: if the source fails, the
//! rotation fails.

use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

/// The entropy source could not produce bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Random bytes generation failed: {0}")]
pub struct EntropyError(pub String);

/// Supplier of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `EntropyError` if the underlying generator is unavailable.
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Operating system CSPRNG via `ring`.
#[derive(Debug)]
pub struct SystemEntropy {
    rng: SystemRandom,
}

impl SystemEntropy {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.rng
            .fill(dest)
            .map_err(|e| EntropyError(format!("system random: {e}")))
    }
}
