//! Test that back-to-back issuance yields distinct, independently valid tokens.

use std::collections::HashSet;

use crate::e2e_tests::helpers::*;

#[test]
fn test_same_second_tokens_differ() {
    let test = TestService::new();

    // The clock does not move, so issued_at is identical for every token.
    let tokens: Vec<String> = (0..50).map(|_| test.issue("user-1", 60)).collect();
    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), tokens.len());

    let mut token_ids = HashSet::new();
    for token in &tokens {
        let claims = test.service.verify(token).expect("verified");
        assert_eq!(claims.issued_at, T0);
        assert!(token_ids.insert(claims.token_id.expect("token id")));
    }
}

#[test]
fn test_consecutive_seconds_tokens_differ() {
    let test = TestService::new();

    let first = test.issue("user-1", 60);
    test.time.advance(1);
    let second = test.issue("user-1", 60);

    assert_ne!(first, second);
    let first_claims = test.service.verify(&first).expect("verified");
    let second_claims = test.service.verify(&second).expect("verified");
    assert_eq!(second_claims.issued_at, first_claims.issued_at + 1);
}
