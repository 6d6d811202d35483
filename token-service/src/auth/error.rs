//! Errors returned by token issuance and verification.
//!
//! Every failure is a distinct variant so callers (notably audit logging) can
//! tell expiry apart from tampering. None of the variants carry secret
//! material or token contents.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error returned when issuing, verifying, or peeking at a token fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is structurally invalid.
    MalformedToken,
    /// No configured key reproduces the token's signature.
    InvalidSignature,
    /// The signature is valid but `expires_at <= now`.
    TokenExpired,
    /// The signature is valid but the issuer does not match the configured one.
    InvalidIssuer,
    /// The service has no signing key configured.
    NotConfigured,
    /// Issuance was requested for an empty subject.
    EmptySubject,
    /// Issuance was requested with a zero or overflowing TTL.
    InvalidTtl,
    /// Extra claims tried to set a claim the service manages.
    ReservedClaim(String),
    /// An extra claim has the wrong shape.
    InvalidClaim(String),
    /// The JWT library failed to sign the claims.
    Encoding(String),
}

impl TokenError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidIssuer => "invalid_issuer",
            Self::NotConfigured => "not_configured",
            Self::EmptySubject => "empty_subject",
            Self::InvalidTtl => "invalid_ttl",
            Self::ReservedClaim(_) => "reserved_claim",
            Self::InvalidClaim(_) => "invalid_claim",
            Self::Encoding(_) => "encoding_failed",
        }
    }

    /// HTTP status the HTTP layer should answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedToken
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::InvalidIssuer => StatusCode::UNAUTHORIZED,
            Self::EmptySubject | Self::InvalidTtl | Self::ReservedClaim(_) | Self::InvalidClaim(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotConfigured | Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::InvalidIssuer => write!(f, "token issuer does not match"),
            Self::NotConfigured => write!(f, "no signing key configured"),
            Self::EmptySubject => write!(f, "subject must not be empty"),
            Self::InvalidTtl => write!(f, "ttl must be positive and within range"),
            Self::ReservedClaim(name) => write!(f, "claim '{name}' is reserved"),
            Self::InvalidClaim(name) => write!(f, "claim '{name}' has an invalid value"),
            Self::Encoding(reason) => write!(f, "failed to encode token: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.code() });
        (self.status_code(), Json(body)).into_response()
    }
}
