//! Token issuance, verification, and introspection.
//!
//! # Pre-conditions
//! - The service is constructed from an explicit `TokenServiceConfig`; there
//!   is no process-wide settings object.
//!
//! # Post-conditions
//! - `verify` returns claims only for tokens whose signature matches a key
//!   in the current snapshot, whose issuer matches (if configured), and
//!   which have not expired.
//!
//! # Invariants
//! - Issuance and verification never perform I/O and never mutate the key
//!   ring; only the rotation methods publish a new snapshot.
//! - Secrets and full tokens are never logged.

use std::time::Duration;

use crate::config::TokenServiceConfig;
use crate::time::{SystemTimeSource, TimeSource};

use super::claims::{Claims, ExtraClaims, ROLES_CLAIM, is_reserved};
use super::error::TokenError;
use super::jwt;
use super::key_ring::KeyStore;
use super::signing_key::{SigningAlgorithm, SigningKey};

/// Issues and verifies signed session tokens.
///
/// `TokenService` is `Send + Sync`; share one instance behind an `Arc`
/// across request handlers.
#[derive(Debug)]
pub struct TokenService<T: TimeSource = SystemTimeSource> {
    keys: KeyStore,
    default_ttl: Duration,
    issuer: Option<String>,
    time: T,
}

impl TokenService {
    /// Create a service reading time from the system clock.
    #[must_use]
    pub fn new(config: TokenServiceConfig) -> Self {
        Self::with_time_source(config, SystemTimeSource)
    }

    /// Decode claims WITHOUT checking the signature, issuer, or expiry.
    ///
    /// For non-security-sensitive introspection only, such as reading the
    /// subject of an expired token for logging. Never use the result to make
    /// an authorization decision. Needs no signing key, so it is available
    /// without a configured service.
    ///
    /// # Errors
    /// Returns `TokenError::MalformedToken` for structurally invalid input.
    pub fn peek_unverified_claims(token: &str) -> Result<Claims, TokenError> {
        jwt::decode_unverified(token).map(|unverified| unverified.claims)
    }
}

impl<T: TimeSource> TokenService<T> {
    /// Create a service reading time from `time`.
    #[must_use]
    pub fn with_time_source(config: TokenServiceConfig, time: T) -> Self {
        let TokenServiceConfig {
            keys,
            default_ttl,
            issuer,
            max_verification_keys,
        } = config;

        Self {
            keys: KeyStore::new(keys, max_verification_keys),
            default_ttl,
            issuer,
            time,
        }
    }

    /// Issue a token for `subject`.
    ///
    /// `ttl` defaults to the configured TTL and must be a whole number of
    /// seconds, since token timestamps have one-second resolution. Extra
    /// claims are merged after
    /// the reserved ones are set; a `roles` entry must be a list of strings.
    ///
    /// # Errors
    /// - `TokenError::NotConfigured` if no signing key is configured.
    /// - `TokenError::EmptySubject` if `subject` is empty.
    /// - `TokenError::InvalidTtl` if the TTL is zero, has a fractional
    ///   second, or the expiry would overflow.
    /// - `TokenError::ReservedClaim` / `TokenError::InvalidClaim` for bad
    ///   extra claims.
    /// - `TokenError::Encoding` if signing fails.
    pub fn issue(
        &self,
        subject: &str,
        extra_claims: ExtraClaims,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let ring = self.keys.snapshot();
        let key = ring.active().ok_or(TokenError::NotConfigured)?;

        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 || ttl.subsec_nanos() != 0 {
            return Err(TokenError::InvalidTtl);
        }

        let issued_at = self.time.now_secs();
        let expires_at = issued_at
            .checked_add(ttl_secs)
            .ok_or(TokenError::InvalidTtl)?;

        let mut claims = Claims {
            subject: subject.to_string(),
            issued_at,
            expires_at,
            issuer: self.issuer.clone(),
            token_id: Some(new_token_id()),
            roles: std::collections::BTreeSet::new(),
            custom: ExtraClaims::new(),
        };
        merge_extra_claims(&mut claims, extra_claims)?;

        let token = jwt::sign(&claims, key)?;
        tracing::debug!(
            subject = %claims.subject,
            key_id = %key.key_id(),
            expires_at,
            "issued token"
        );

        Ok(token)
    }

    /// Verify `token` and return its claims.
    ///
    /// The token is decoded structurally first; malformed input fails
    /// without any cryptographic work. Each candidate key is then tried,
    /// the one named by the `kid` header first. Only after a signature
    /// matches are the issuer and expiry checked.
    ///
    /// # Errors
    /// - `TokenError::NotConfigured` if no signing key is configured.
    /// - `TokenError::MalformedToken` for structurally invalid input or an
    ///   algorithm this service never signs with.
    /// - `TokenError::InvalidSignature` if no configured key matches.
    /// - `TokenError::InvalidIssuer` if the issuer differs from the
    ///   configured one.
    /// - `TokenError::TokenExpired` if `expires_at <= now`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let ring = self.keys.snapshot();
        if ring.is_empty() {
            return Err(rejected(TokenError::NotConfigured));
        }

        let unverified = jwt::decode_unverified(token).map_err(rejected)?;
        let Some(algorithm) = SigningAlgorithm::from_jwt(unverified.header.alg) else {
            return Err(rejected(TokenError::MalformedToken));
        };

        let mut verified = None;
        for key in ring.candidates(algorithm, unverified.header.kid.as_deref()) {
            match jwt::verify_signature(token, key) {
                Ok(claims) => {
                    verified = Some((key.key_id(), claims));
                    break;
                }
                Err(TokenError::InvalidSignature) => {}
                Err(other) => return Err(rejected(other)),
            }
        }
        let Some((key_id, claims)) = verified else {
            return Err(rejected(TokenError::InvalidSignature));
        };

        if let Some(expected) = &self.issuer {
            if claims.issuer.as_ref() != Some(expected) {
                return Err(rejected(TokenError::InvalidIssuer));
            }
        }

        if claims.is_expired_at(self.time.now_secs()) {
            // The signature matched, so the subject is trustworthy enough to log.
            tracing::warn!(
                code = TokenError::TokenExpired.code(),
                subject = %claims.subject,
                expires_at = claims.expires_at,
                "token verification failed"
            );
            return Err(TokenError::TokenExpired);
        }

        tracing::debug!(subject = %claims.subject, key_id = %key_id, "verified token");
        Ok(claims)
    }

    /// Make `key` the active issuance key.
    ///
    /// Older keys stay available for verification until they fall beyond
    /// the retention limit.
    pub fn rotate(&self, key: SigningKey) {
        let key_id = key.key_id().to_string();
        let retained = self.keys.rotate(key);
        tracing::info!(
            key_id = %key_id,
            retained = ?retained,
            "rotated signing key"
        );
    }

    /// Stop accepting tokens signed with `key_id`.
    ///
    /// Returns whether the key was present. Retiring the last key leaves the
    /// service unconfigured.
    pub fn retire(&self, key_id: &str) -> bool {
        let removed = self.keys.retire(key_id);
        if removed {
            tracing::info!(key_id = %key_id, "retired signing key");
        }
        removed
    }

    /// Replace the whole key ring, newest key first.
    ///
    /// Keys beyond the retention limit are dropped, oldest first.
    pub fn replace_keys(&self, keys: Vec<SigningKey>) {
        let key_ids = self.keys.replace(keys);
        tracing::info!(key_ids = ?key_ids, "replaced signing keys");
    }

    /// Configured key ids, newest first.
    #[must_use]
    pub fn key_ids(&self) -> Vec<String> {
        self.keys.snapshot().key_ids()
    }

    /// TTL applied when `issue` is called without one.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }
}

/// Logs a verification failure by code only.
fn rejected(error: TokenError) -> TokenError {
    tracing::warn!(code = error.code(), "token verification failed");
    error
}

/// Random 128-bit token id, hex encoded.
fn new_token_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn merge_extra_claims(claims: &mut Claims, extra_claims: ExtraClaims) -> Result<(), TokenError> {
    for (name, value) in extra_claims {
        if is_reserved(&name) {
            return Err(TokenError::ReservedClaim(name));
        }
        if name == ROLES_CLAIM {
            claims.roles =
                serde_json::from_value(value).map_err(|_| TokenError::InvalidClaim(name))?;
        } else {
            claims.custom.insert(name, value);
        }
    }
    Ok(())
}
