//! Metrics definitions for the secret ring
//!
//! All metrics follow Prometheus naming conventions:
//! - `keyring_` prefix
//! - `_total` suffix for counters
//!
//! Recording is a no-op until the embedding service installs a recorder.
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: 2 values (success, error)

use metrics::{counter, gauge, histogram};

// ============================================================================
// Rotation Metrics
// ============================================================================

/// Record a rotation attempt
///
/// Metric: `keyring_rotations_total`
/// Labels: `status`
pub fn record_rotation(status: &'static str) {
    counter!("keyring_rotations_total", "status" => status).increment(1);
}

/// Update the number of secrets currently held by the ring
///
/// Metric: `keyring_active_secrets`
#[allow(clippy::cast_precision_loss)]
pub fn set_active_secrets(count: usize) {
    gauge!("keyring_active_secrets").set(count as f64);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record a token signing outcome
///
/// Metric: `keyring_tokens_signed_total`
/// Labels: `status`
pub fn record_token_signing(status: &'static str) {
    counter!("keyring_tokens_signed_total", "status" => status).increment(1);
}

/// Record a token verification outcome
///
/// Metric: `keyring_token_verifications_total`
/// Labels: `status`
///
/// On success, `attempts` is how many secrets were tried (1 = newest secret).
/// Metric: `keyring_verify_attempts`
#[allow(clippy::cast_precision_loss)]
pub fn record_token_verification(status: &'static str, attempts: usize) {
    counter!("keyring_token_verifications_total", "status" => status).increment(1);

    if status == "success" {
        histogram!("keyring_verify_attempts").record(attempts as f64);
    }
}
