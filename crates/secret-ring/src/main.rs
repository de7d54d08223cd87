//! Rotation demo.
//!
//! Signs one token and shows it staying valid across rotations until the
//! secret that signed it leaves the ring.

use secret_ring::config::KeyringConfig;
use secret_ring::jwt::Payload;
use secret_ring::ring::SecretRing;
use secret_ring::token_service::TokenService;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting rotation demo");

    let config = KeyringConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        capacity = config.ring.capacity,
        token_ttl_secs = config.token_ttl.as_secs(),
        "Configuration loaded successfully"
    );

    let ring = Arc::new(SecretRing::new(&config.ring));
    let service = TokenService::from_config(Arc::clone(&ring), &config);

    ring.rotate()?;

    let mut payload = Payload::new();
    payload.insert("userId".to_string(), json!(123));
    payload.insert("role".to_string(), json!("admin"));

    let token = service.sign(&payload)?;
    info!(token_len = token.len(), "Token issued");

    let claims = service.verify(&token)?;
    info!(claims = ?claims, "Token verified with the secret that signed it");

    // One more rotation than the ring holds guarantees eviction.
    for rotation in 1..=config.ring.capacity {
        let secret = ring.rotate()?;
        match service.verify(&token) {
            Ok(_) => info!(
                rotation,
                current_sequence = secret.sequence(),
                "Token still verifies"
            ),
            Err(e) => {
                warn!(
                    rotation,
                    current_sequence = secret.sequence(),
                    error = %e,
                    "Token no longer verifies, its secret has been evicted"
                );
                break;
            }
        }
    }

    info!("Rotation demo finished");
    Ok(())
}

/// Text output by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "secret_ring=debug,rotation_demo=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
