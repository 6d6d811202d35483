//! Claims carried inside a session token.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitrary caller-supplied claims merged into a token at issuance.
pub type ExtraClaims = Map<String, Value>;

/// Claim names managed by the service. Callers may not set these.
pub const RESERVED_CLAIMS: [&str; 6] = ["sub", "iat", "exp", "iss", "jti", "nbf"];

/// Claim name holding the typed role set.
pub const ROLES_CLAIM: &str = "roles";

/// Decoded token claims.
///
/// Reserved claims are typed; everything else lands in `custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identity.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Issuance time, seconds since Unix epoch.
    #[serde(rename = "iat")]
    pub issued_at: u64,
    /// Expiry time, seconds since Unix epoch.
    #[serde(rename = "exp")]
    pub expires_at: u64,
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Unique token id.
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: BTreeSet<String>,
    /// Custom claims.
    #[serde(flatten)]
    pub custom: ExtraClaims,
}

impl Claims {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Look up a custom claim by name.
    #[must_use]
    pub fn custom_claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Whether the token is expired at `now_secs`.
    ///
    /// A token is valid only while `expires_at > now`.
    #[must_use]
    pub const fn is_expired_at(&self, now_secs: u64) -> bool {
        self.expires_at <= now_secs
    }
}

/// Returns true if `name` is managed by the service.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}
