//! Authentication module.
//!
//! This module provides session token issuance and verification for the
//! API services.
//!
//! # Pre-conditions
//! - Services are configured with at least one signing key before issuing.
//!
//! # Post-conditions
//! - Issued tokens are immutable; they end only by expiry or by their key
//!   leaving the key ring.
//!
//! # Invariants
//! - Verification never returns claims from an unverified token.

pub mod claims;
pub mod error;
pub(crate) mod jwt;
pub mod key_ring;
pub mod service;
pub mod signing_key;

pub use claims::{Claims, ExtraClaims};
pub use error::TokenError;
pub use key_ring::{KeyRing, KeyStore};
pub use service::TokenService;
pub use signing_key::{SigningAlgorithm, SigningKey, SigningKeyError};
