//! Test the basic issue-then-verify flow.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::json;

use crate::auth::{SigningAlgorithm, TokenError};
use crate::config::TokenServiceConfig;
use crate::e2e_tests::helpers::*;

#[test]
fn test_admin_session_scenario() {
    let test = TestService::new();

    let token = test
        .service
        .issue(
            "user-42",
            extra(json!({ "roles": ["admin"] })),
            Some(Duration::from_secs(3600)),
        )
        .expect("issued");

    let claims = test.service.verify(&token).expect("verified");
    assert_eq!(claims.subject, "user-42");
    assert_eq!(claims.roles, BTreeSet::from(["admin".to_string()]));
    assert_eq!(claims.issued_at, T0);
    assert_eq!(claims.expires_at, T0 + 3600);
    assert!(claims.has_role("admin"));

    test.time.set(T0 + 3601);
    assert_eq!(test.service.verify(&token), Err(TokenError::TokenExpired));
}

#[test]
fn test_issue_verify_many_subjects_and_ttls() {
    let test = TestService::new();

    for subject in ["a", "alice", "user-123", "ünïcødé", &"x".repeat(512)] {
        for ttl in [1, 59, 3600, 86_400 * 30] {
            let token = test.issue(subject, ttl);
            let claims = test.service.verify(&token).expect("verified");

            assert_eq!(claims.subject, subject);
            assert_eq!(claims.expires_at - claims.issued_at, ttl);
        }
    }
}

#[test]
fn test_every_algorithm_round_trips() {
    for algorithm in [
        SigningAlgorithm::Hs256,
        SigningAlgorithm::Hs384,
        SigningAlgorithm::Hs512,
    ] {
        let test = TestService::with_config(TokenServiceConfig::new(vec![test_key_with(
            "k1", algorithm,
        )]));
        let token = test.issue("user-1", 60);

        let header = jsonwebtoken::decode_header(&token).expect("header");
        assert_eq!(header.alg, algorithm.to_jwt());
        assert_eq!(test.service.verify(&token).map(|c| c.subject), Ok("user-1".to_string()));
    }
}

#[test]
fn test_algorithm_mismatch_is_signature_failure() {
    let issuer = TestService::with_config(TokenServiceConfig::new(vec![test_key_with(
        "k1",
        SigningAlgorithm::Hs512,
    )]));
    let verifier = TestService::new();

    let token = issuer.issue("user-1", 60);
    assert_eq!(verifier.service.verify(&token), Err(TokenError::InvalidSignature));
}
