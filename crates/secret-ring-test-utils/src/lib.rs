//! # Secret Ring Test Utilities
//!
//! Shared test utilities for the `secret-ring` crate.
//!
//! This crate provides:
//! - Deterministic and failing entropy sources, plus ring/service builders
//! - Payload builders (`TestPayloadBuilder`)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use secret_ring_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let service = test_service(2, 300);
//!     service.ring().rotate().unwrap();
//!
//!     let payload = TestPayloadBuilder::new().for_user(123).with_role("admin").build();
//!     let token = service.sign(&payload).unwrap();
//!
//!     token.assert_valid_jwt().assert_has_claim("role", "admin");
//! }
//! ```

pub mod assertions;
pub mod entropy_fixtures;
pub mod payload_builders;

// Re-export commonly used items
pub use assertions::*;
pub use entropy_fixtures::*;
pub use payload_builders::*;
