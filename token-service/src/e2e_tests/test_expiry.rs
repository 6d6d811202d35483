//! Test that expiry is reported as expiry, never as a signature failure.

use crate::auth::TokenError;
use crate::e2e_tests::helpers::*;

#[test]
fn test_valid_until_expiry() {
    let test = TestService::new();

    for ttl in [1, 2, 30, 3600] {
        test.time.set(T0);
        let token = test.issue("user-1", ttl);

        test.time.set(T0 + ttl - 1);
        assert!(test.service.verify(&token).is_ok(), "ttl {ttl} expired early");

        test.time.set(T0 + ttl);
        assert_eq!(test.service.verify(&token), Err(TokenError::TokenExpired));

        test.time.set(T0 + ttl + 1_000_000);
        assert_eq!(test.service.verify(&token), Err(TokenError::TokenExpired));
    }
}

#[test]
fn test_expired_token_with_bad_signature_is_signature_failure() {
    let test = TestService::new();
    let token = test.issue("user-1", 10);
    test.time.advance(3600);

    let (unsigned, _) = token.rsplit_once('.').expect("three segments");
    let forged = format!("{unsigned}.{}", "A".repeat(43));

    assert_eq!(test.service.verify(&forged), Err(TokenError::InvalidSignature));
}

#[test]
fn test_expiry_is_judged_against_current_clock() {
    let test = TestService::new();
    let token = test.issue("user-1", 60);

    test.time.advance(61);
    assert_eq!(test.service.verify(&token), Err(TokenError::TokenExpired));

    test.time.set(T0 + 30);
    assert!(test.service.verify(&token).is_ok());
}
