//! Compact JWS encoding and decoding.
//!
//! Provides the structural decode used by both verification and unverified
//! introspection, plus signing and per-key signature verification.
//!
//! # Pre-conditions
//! - Signing keys are HMAC keys built through `SigningKey::new`.
//!
//! # Post-conditions
//! - `decode_unverified` never performs cryptographic work.
//! - `verify_signature` returns claims only when the key reproduces the
//!   token's signature.
//!
//! # Invariants
//! - Decoding is stateless; the same inputs always produce the same outputs.
//! - Expiry is never judged here. Callers compare `expires_at` against their
//!   own time source.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Header, Validation, decode, decode_header, encode};

use super::claims::Claims;
use super::error::TokenError;
use super::signing_key::SigningKey;

/// A token whose structure has been checked but whose signature has not.
#[derive(Debug)]
pub struct UnverifiedToken {
    pub header: Header,
    pub claims: Claims,
}

/// Decodes header and claims without checking the signature.
///
/// # Errors
/// Returns `TokenError::MalformedToken` unless the token has exactly three
/// non-empty segments, a parseable header, and a payload that deserializes
/// into `Claims`.
pub fn decode_unverified(token: &str) -> Result<UnverifiedToken, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::MalformedToken);
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::MalformedToken);
    }

    let header = decode_header(token).map_err(|_| TokenError::MalformedToken)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::MalformedToken)?;
    let claims =
        serde_json::from_slice::<Claims>(&payload).map_err(|_| TokenError::MalformedToken)?;

    Ok(UnverifiedToken { header, claims })
}

/// Signs `claims` with `key`, stamping the key id into the header.
///
/// # Errors
/// Returns `TokenError::Encoding` if the claims cannot be serialized or signed.
pub fn sign(claims: &Claims, key: &SigningKey) -> Result<String, TokenError> {
    let mut header = Header::new(key.algorithm().to_jwt());
    header.kid = Some(key.key_id().to_string());

    encode(&header, claims, key.encoding_key()).map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verifies the token's signature under `key` and returns its claims.
///
/// Only the signature is checked; registered-claim validation is left to
/// the caller.
///
/// # Errors
/// Returns `TokenError::InvalidSignature` if `key` does not reproduce the
/// signature, `TokenError::MalformedToken` for anything structural.
pub fn verify_signature(token: &str, key: &SigningKey) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(key.algorithm().to_jwt());
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;

    decode::<Claims>(token, key.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

/// Maps jsonwebtoken errors to our `TokenError` type.
///
/// By the time a signature is checked the header and payload are known to
/// decode, so a base64 failure can only come from the signature segment.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::TokenExpired,
        _ => TokenError::MalformedToken,
    }
}
