//! Token service configuration.
//!
//! This module provides configuration loading for the token service from
//! environment variables and an optional key-ring file.
//!
//! # Environment Variables
//!
//! - `TOKEN_SIGNING_SECRET`: HMAC secret (required unless `TOKEN_KEY_RING_FILE` is set)
//! - `TOKEN_SIGNING_ALGORITHM`: `HS256`, `HS384` or `HS512` (default: `HS256`)
//! - `TOKEN_SIGNING_KEY_ID`: key id stamped into issued tokens (default: `primary`)
//! - `TOKEN_DEFAULT_TTL_SECS`: default token lifetime (default: `3600`)
//! - `TOKEN_ISSUER`: issuer embedded and checked on verify (default: unset)
//! - `TOKEN_MAX_VERIFICATION_KEYS`: keys retained across rotations (default: `3`)
//! - `TOKEN_KEY_RING_FILE`: JSON file listing keys, newest first
//!
//! # Invariants
//!
//! - There is no default secret; a missing secret is an error.
//! - `default_ttl` is at least one second.
//! - `max_verification_keys` is at least one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::{SigningAlgorithm, SigningKey, SigningKeyError};

/// Configuration for a `TokenService`.
///
/// Passed explicitly at construction so tests can build services with
/// distinct key material side by side.
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Signing keys, newest first. The first key signs new tokens.
    pub keys: Vec<SigningKey>,
    /// Lifetime used when `issue` is called without a TTL.
    pub default_ttl: Duration,
    /// Issuer embedded in new tokens and required on verification.
    pub issuer: Option<String>,
    /// Number of keys retained when a new key is rotated in.
    pub max_verification_keys: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
    /// The key-ring file could not be read or parsed.
    KeyRingFile { path: PathBuf, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
            Self::KeyRingFile { path, message } => {
                write!(f, "invalid key ring file {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One entry of a key-ring file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyRingEntry {
    kid: String,
    #[serde(default)]
    alg: SigningAlgorithm,
    secret: String,
}

impl TokenServiceConfig {
    /// Default token lifetime.
    pub const DEFAULT_TTL_SECS: u64 = 3600;
    /// Default number of keys kept for verification across rotations.
    pub const DEFAULT_MAX_VERIFICATION_KEYS: usize = 3;
    /// Default key id for a single secret from the environment.
    pub const DEFAULT_KEY_ID: &'static str = "primary";

    /// Create a configuration with default TTL, no issuer, and the given keys.
    #[must_use]
    pub const fn new(keys: Vec<SigningKey>) -> Self {
        Self {
            keys,
            default_ttl: Duration::from_secs(Self::DEFAULT_TTL_SECS),
            issuer: None,
            max_verification_keys: Self::DEFAULT_MAX_VERIFICATION_KEYS,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    #[must_use]
    pub fn with_max_verification_keys(mut self, max_verification_keys: usize) -> Self {
        self.max_verification_keys = max_verification_keys;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - neither `TOKEN_KEY_RING_FILE` nor `TOKEN_SIGNING_SECRET` is set
    /// - any value is present but invalid
    /// - the key-ring file cannot be read or is empty
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// See [`TokenServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys = match non_empty(&lookup, "TOKEN_KEY_RING_FILE") {
            Some(path) => load_key_ring_file(Path::new(&path))?,
            None => vec![Self::load_signing_key(&lookup)?],
        };
        let default_ttl = Duration::from_secs(parse_positive(
            &lookup,
            "TOKEN_DEFAULT_TTL_SECS",
            Self::DEFAULT_TTL_SECS,
        )?);
        let issuer = non_empty(&lookup, "TOKEN_ISSUER");
        let max_verification_keys = usize::try_from(parse_positive(
            &lookup,
            "TOKEN_MAX_VERIFICATION_KEYS",
            Self::DEFAULT_MAX_VERIFICATION_KEYS as u64,
        )?)
        .map_err(|_| ConfigError::InvalidValue {
            name: "TOKEN_MAX_VERIFICATION_KEYS".to_string(),
            message: "too large".to_string(),
        })?;

        Ok(Self {
            keys,
            default_ttl,
            issuer,
            max_verification_keys,
        })
    }

    /// Load the single signing key described by the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is not set or empty, or if the
    /// algorithm is unsupported.
    fn load_signing_key<F>(lookup: &F) -> Result<SigningKey, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("TOKEN_SIGNING_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_SIGNING_SECRET".to_string()))?;

        let algorithm = match non_empty(lookup, "TOKEN_SIGNING_ALGORITHM") {
            Some(value) => value.parse::<SigningAlgorithm>().map_err(|e| ConfigError::InvalidValue {
                name: "TOKEN_SIGNING_ALGORITHM".to_string(),
                message: e.to_string(),
            })?,
            None => SigningAlgorithm::default(),
        };

        let key_id = non_empty(lookup, "TOKEN_SIGNING_KEY_ID")
            .unwrap_or_else(|| Self::DEFAULT_KEY_ID.to_string());

        SigningKey::new(key_id, algorithm, secret.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                name: "TOKEN_SIGNING_SECRET".to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Read a key-ring file: a JSON array of `{"kid", "alg", "secret"}` objects,
/// newest first.
///
/// # Errors
///
/// Returns `ConfigError::KeyRingFile` if the file cannot be read, does not
/// parse, is empty, or contains an invalid key.
pub fn load_key_ring_file(path: &Path) -> Result<Vec<SigningKey>, ConfigError> {
    let file_error = |message: String| ConfigError::KeyRingFile {
        path: path.to_path_buf(),
        message,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let entries: Vec<KeyRingEntry> =
        serde_json::from_str(&contents).map_err(|e| file_error(e.to_string()))?;
    if entries.is_empty() {
        return Err(file_error("no keys listed".to_string()));
    }

    entries
        .into_iter()
        .map(|entry| {
            SigningKey::new(entry.kid.clone(), entry.alg, entry.secret.as_bytes()).map_err(
                |e: SigningKeyError| file_error(format!("key '{}': {e}", entry.kid)),
            )
        })
        .collect()
}

/// Look up `name`, treating an empty value as unset.
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

/// Parse `name` as a positive integer, falling back to `default` if unset.
///
/// # Errors
///
/// Returns an error if the value is set but not a positive integer.
fn parse_positive<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("'{value}' is not a positive integer"),
            }),
        },
        None => Ok(default),
    }
}
