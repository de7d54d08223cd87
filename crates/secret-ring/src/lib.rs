//! Rotating-secret token issuance and verification.
//!
//! A [`SecretRing`](ring::SecretRing) keeps a bounded, ordered history of
//! symmetric signing secrets. A [`TokenService`](token_service::TokenService)
//! signs with the newest secret and verifies against every secret still in
//! the ring, so tokens issued just before a rotation stay valid until their
//! secret is evicted or the token expires.
//!
//! ```rust,ignore
//! use secret_ring::config::KeyringConfig;
//! use secret_ring::ring::SecretRing;
//! use secret_ring::token_service::TokenService;
//! use std::sync::Arc;
//!
//! let config = KeyringConfig::default();
//! let ring = Arc::new(SecretRing::new(&config.ring));
//! ring.rotate()?;
//!
//! let tokens = TokenService::from_config(Arc::clone(&ring), &config);
//! let token = tokens.sign(&payload)?;
//! let claims = tokens.verify(&token)?;
//! ```

#![warn(clippy::pedantic)]

/// Module for configuration loading and bounds
pub mod config;

/// Module for error types
pub mod error;

/// Module for secret material and redaction helpers
pub mod secret;

/// Module for the random byte source used by rotation
pub mod entropy;

/// Module for the bounded secret history
pub mod ring;

/// Module for the JWT token codec and claims
pub mod jwt;

/// Module for signing and verifying tokens against the ring
pub mod token_service;

/// Module for the periodic rotation background task
pub mod rotation;

/// Module for metrics and log correlation helpers
pub mod observability;

pub use error::{KeyringError, Result};
