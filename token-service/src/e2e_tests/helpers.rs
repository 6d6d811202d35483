//! Common helpers for end-to-end tests.

use std::time::Duration;

use crate::auth::{ExtraClaims, SigningAlgorithm, SigningKey, TokenService};
use crate::config::TokenServiceConfig;
use crate::time::ManualTimeSource;

/// Start of every test clock.
pub const T0: u64 = 1_700_000_000;

/// A token service paired with the clock that drives it.
pub struct TestService {
    pub service: TokenService<ManualTimeSource>,
    pub time: ManualTimeSource,
}

impl TestService {
    /// Create a service with a single HS256 key `k1`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TokenServiceConfig::new(vec![test_key("k1")]))
    }

    #[must_use]
    pub fn with_config(config: TokenServiceConfig) -> Self {
        let time = ManualTimeSource::new(T0);
        let service = TokenService::with_time_source(config, time.clone());
        Self { service, time }
    }

    /// Issue a token with no extra claims.
    pub fn issue(&self, subject: &str, ttl_secs: u64) -> String {
        #[allow(clippy::expect_used)]
        let token = self
            .service
            .issue(subject, ExtraClaims::new(), Some(Duration::from_secs(ttl_secs)))
            .expect("Failed to issue token");
        token
    }
}

/// Deterministic HS256 key whose secret is derived from its id.
#[must_use]
pub fn test_key(id: &str) -> SigningKey {
    test_key_with(id, SigningAlgorithm::Hs256)
}

#[must_use]
pub fn test_key_with(id: &str, algorithm: SigningAlgorithm) -> SigningKey {
    let secret = format!("{id}:{}", "s".repeat(algorithm.recommended_secret_len()));

    #[allow(clippy::expect_used)]
    let key = SigningKey::new(id, algorithm, secret).expect("Failed to create test key");
    key
}

/// Build an `ExtraClaims` map from a JSON object literal.
pub fn extra(value: serde_json::Value) -> ExtraClaims {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("Expected JSON object, got {other}"),
    }
}
