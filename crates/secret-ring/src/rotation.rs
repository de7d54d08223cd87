//! Scheduled rotation background task.
//!
//! Rotates the ring once immediately and then on every tick of the configured
//! interval. A failed rotation is logged and retried on the next tick; the
//! ring keeps serving its existing secrets in the meantime.
//!
//! # Graceful Shutdown
//!
//! The task exits when its cancellation token is triggered. A rotation that
//! is already running completes first.

use crate::ring::SecretRing;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Run the rotation loop until `cancel_token` is cancelled.
///
/// # Arguments
///
/// * `ring` - Ring to rotate
/// * `interval` - Time between rotations (the first happens immediately)
/// * `cancel_token` - Token for graceful shutdown
pub async fn run_rotation_task(
    ring: Arc<SecretRing>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    tracing::info!(
        target: "secret_ring.rotation",
        interval_secs = interval.as_secs(),
        "Rotation task started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = ring.rotate() {
                    tracing::error!(
                        target: "secret_ring.rotation",
                        error = %e,
                        "Scheduled rotation failed, retrying next tick"
                    );
                }
            }
            () = cancel_token.cancelled() => {
                tracing::info!(
                    target: "secret_ring.rotation",
                    "Rotation task received shutdown signal, exiting"
                );
                break;
            }
        }
    }
}

/// Spawn [`run_rotation_task`] on the current tokio runtime.
#[must_use]
pub fn spawn_rotation_task(
    ring: Arc<SecretRing>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        run_rotation_task(ring, interval, cancel_token)
            .instrument(tracing::info_span!("secret_ring.rotation_task")),
    )
}
