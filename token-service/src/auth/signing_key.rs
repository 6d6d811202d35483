//! Signing key material for token issuance and verification.
//!
//! # Pre-conditions
//! - Secrets and key ids must be non-empty.
//!
//! # Post-conditions
//! - `SigningKey` instances are immutable once created.
//! - The raw secret is never retained in printable form; `Debug` output shows
//!   only the key id and algorithm.
//!
//! # Invariants
//! - Every `SigningKey` carries an HMAC algorithm and matching encoding and
//!   decoding keys derived from the same secret.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::Deserialize;

/// Error returned when signing key material is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeyError {
    /// The secret is empty.
    EmptySecret,
    /// The key id is empty.
    EmptyKeyId,
    /// The algorithm name is not one of the supported MAC algorithms.
    UnsupportedAlgorithm(String),
}

impl std::fmt::Display for SigningKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "signing secret must not be empty"),
            Self::EmptyKeyId => write!(f, "signing key id must not be empty"),
            Self::UnsupportedAlgorithm(name) => {
                write!(f, "unsupported signing algorithm: {name}")
            }
        }
    }
}

impl std::error::Error for SigningKeyError {}

/// Supported MAC algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    /// HMAC-SHA256.
    #[default]
    Hs256,
    /// HMAC-SHA384.
    Hs384,
    /// HMAC-SHA512.
    Hs512,
}

impl SigningAlgorithm {
    /// The corresponding `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
        }
    }

    /// Map a header algorithm back to a supported one.
    ///
    /// Returns `None` for asymmetric algorithms, which this service never
    /// issues and therefore never accepts.
    #[must_use]
    pub const fn from_jwt(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::HS256 => Some(Self::Hs256),
            Algorithm::HS384 => Some(Self::Hs384),
            Algorithm::HS512 => Some(Self::Hs512),
            _ => None,
        }
    }

    /// Recommended minimum secret length in bytes (the MAC output size).
    #[must_use]
    pub const fn recommended_secret_len(self) -> usize {
        match self {
            Self::Hs256 => 32,
            Self::Hs384 => 48,
            Self::Hs512 => 64,
        }
    }

    /// Canonical name as it appears in token headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = SigningKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            _ => Err(SigningKeyError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// One version of signing key material.
///
/// Holds the derived `jsonwebtoken` keys rather than the secret itself.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Create a new signing key.
    ///
    /// # Pre-conditions
    /// - `key_id` and `secret` must not be empty.
    ///
    /// # Errors
    /// Returns `SigningKeyError::EmptyKeyId` or `SigningKeyError::EmptySecret`.
    pub fn new(
        key_id: impl Into<String>,
        algorithm: SigningAlgorithm,
        secret: impl AsRef<[u8]>,
    ) -> Result<Self, SigningKeyError> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(SigningKeyError::EmptyKeyId);
        }

        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }
        if secret.len() < algorithm.recommended_secret_len() {
            tracing::warn!(
                key_id = %key_id,
                "{algorithm} secret is shorter than the recommended {} bytes",
                algorithm.recommended_secret_len()
            );
        }

        Ok(Self {
            key_id,
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Key id stamped into the `kid` header of tokens signed with this key.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub const fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}
