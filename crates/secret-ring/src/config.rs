//! Configuration for the secret ring, token lifetime and rotation cadence.
//!
//! Values are read from environment variables by [`KeyringConfig::from_env`].
//! Every option has a default; out-of-range values are rejected rather than
//! clamped so a misconfigured deployment fails at startup.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default number of secrets retained by the ring.
pub const DEFAULT_RING_CAPACITY: usize = 2;

/// Upper bound on ring capacity. Verification is a linear scan over the ring.
pub const MAX_RING_CAPACITY: usize = 16;

/// Default validity window for signed tokens (5 minutes).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Longest accepted token TTL (24 hours).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(86_400);

/// Default secret size in bytes (256 bits).
pub const DEFAULT_SECRET_BYTE_LENGTH: usize = 32;

/// Smallest accepted secret size in bytes (256 bits).
pub const MIN_SECRET_BYTE_LENGTH: usize = 32;

/// Largest accepted secret size in bytes.
pub const MAX_SECRET_BYTE_LENGTH: usize = 1024;

/// Default interval between scheduled rotations (1 hour).
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(3600);

const RING_CAPACITY_VAR: &str = "KEYRING_RING_CAPACITY";
const TOKEN_TTL_VAR: &str = "KEYRING_TOKEN_TTL_SECONDS";
const SECRET_BYTE_LENGTH_VAR: &str = "KEYRING_SECRET_BYTE_LENGTH";
const ROTATION_INTERVAL_VAR: &str = "KEYRING_ROTATION_INTERVAL_SECONDS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Failed to parse {name}: {value:?} is not a non-negative integer")]
    Parse { name: String, value: String },
}

/// Settings consumed by [`SecretRing`](crate::ring::SecretRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of secrets kept. `1` makes every rotation destructive.
    pub capacity: usize,
    /// Random bytes drawn per generated secret.
    pub secret_byte_length: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RING_CAPACITY,
            secret_byte_length: DEFAULT_SECRET_BYTE_LENGTH,
        }
    }
}

impl RingConfig {
    /// Create a ring configuration, validating both bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `capacity` is outside
    /// `1..=MAX_RING_CAPACITY` or `secret_byte_length` is outside
    /// `MIN_SECRET_BYTE_LENGTH..=MAX_SECRET_BYTE_LENGTH`.
    pub fn new(capacity: usize, secret_byte_length: usize) -> Result<Self, ConfigError> {
        if !(1..=MAX_RING_CAPACITY).contains(&capacity) {
            return Err(ConfigError::InvalidValue {
                name: RING_CAPACITY_VAR.to_string(),
                reason: format!("{capacity} is not in 1..={MAX_RING_CAPACITY}"),
            });
        }

        if !(MIN_SECRET_BYTE_LENGTH..=MAX_SECRET_BYTE_LENGTH).contains(&secret_byte_length) {
            return Err(ConfigError::InvalidValue {
                name: SECRET_BYTE_LENGTH_VAR.to_string(),
                reason: format!(
                    "{secret_byte_length} is not in {MIN_SECRET_BYTE_LENGTH}..={MAX_SECRET_BYTE_LENGTH}"
                ),
            });
        }

        Ok(Self {
            capacity,
            secret_byte_length,
        })
    }
}

/// Full configuration for a token-issuing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyringConfig {
    pub ring: RingConfig,
    /// Validity window stamped into every signed token.
    pub token_ttl: Duration,
    /// Cadence used by [`spawn_rotation_task`](crate::rotation::spawn_rotation_task).
    pub rotation_interval: Duration,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            token_ttl: DEFAULT_TOKEN_TTL,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
        }
    }
}

impl KeyringConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// See [`KeyringConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if a variable is not an integer and
    /// `ConfigError::InvalidValue` if it is outside its accepted range.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let capacity = parse_or(vars, RING_CAPACITY_VAR, DEFAULT_RING_CAPACITY as u64)?;
        let secret_byte_length =
            parse_or(vars, SECRET_BYTE_LENGTH_VAR, DEFAULT_SECRET_BYTE_LENGTH as u64)?;

        let ring = RingConfig::new(to_usize(capacity), to_usize(secret_byte_length))?;

        let ttl_secs = parse_or(vars, TOKEN_TTL_VAR, DEFAULT_TOKEN_TTL.as_secs())?;
        let token_ttl = Duration::from_secs(ttl_secs);
        if token_ttl.is_zero() || token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::InvalidValue {
                name: TOKEN_TTL_VAR.to_string(),
                reason: format!("{ttl_secs} is not in 1..={}", MAX_TOKEN_TTL.as_secs()),
            });
        }

        let interval_secs = parse_or(
            vars,
            ROTATION_INTERVAL_VAR,
            DEFAULT_ROTATION_INTERVAL.as_secs(),
        )?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: ROTATION_INTERVAL_VAR.to_string(),
                reason: "rotation interval must be at least 1 second".to_string(),
            });
        }

        Ok(KeyringConfig {
            ring,
            token_ttl,
            rotation_interval: Duration::from_secs(interval_secs),
        })
    }
}

fn parse_or(vars: &HashMap<String, String>, name: &str, default: u64) -> Result<u64, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Parse {
            name: name.to_string(),
            value: raw.clone(),
        }),
    }
}

// Values above usize::MAX are rejected by the range checks that follow.
fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
