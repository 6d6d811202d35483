//! Test key rotation: old tokens survive until their key leaves the ring.

use crate::auth::TokenError;
use crate::config::TokenServiceConfig;
use crate::e2e_tests::helpers::*;

#[test]
fn test_rotation_lifecycle() {
    let test = TestService::with_config(
        TokenServiceConfig::new(vec![test_key("2026-07")]).with_max_verification_keys(2),
    );
    let july = test.issue("user-1", 86_400);

    test.service.rotate(test_key("2026-08"));
    let august = test.issue("user-1", 86_400);
    assert!(test.service.verify(&july).is_ok());
    assert!(test.service.verify(&august).is_ok());

    test.service.rotate(test_key("2026-09"));
    assert_eq!(test.service.key_ids(), vec!["2026-09", "2026-08"]);
    assert_eq!(test.service.verify(&july), Err(TokenError::InvalidSignature));
    assert!(test.service.verify(&august).is_ok());
}

#[test]
fn test_rotation_does_not_extend_expiry() {
    let test = TestService::new();
    let token = test.issue("user-1", 60);

    test.service.rotate(test_key("k2"));
    test.time.advance(60);

    assert_eq!(test.service.verify(&token), Err(TokenError::TokenExpired));
}

#[test]
fn test_replace_keys_from_reloaded_ring() {
    let test = TestService::new();
    let old = test.issue("user-1", 600);

    test.service.replace_keys(vec![test_key("k2"), test_key("k1")]);
    let new = test.issue("user-1", 600);
    assert!(test.service.verify(&old).is_ok());

    test.service.replace_keys(vec![test_key("k2")]);
    assert_eq!(test.service.verify(&old), Err(TokenError::InvalidSignature));
    assert!(test.service.verify(&new).is_ok());
}

#[test]
fn test_retire_everything_unconfigures() {
    let test = TestService::new();
    let token = test.issue("user-1", 600);

    assert!(test.service.retire("k1"));
    assert!(test.service.key_ids().is_empty());
    assert_eq!(test.service.verify(&token), Err(TokenError::NotConfigured));
    assert_eq!(
        test.service
            .issue("user-1", crate::auth::ExtraClaims::new(), None),
        Err(TokenError::NotConfigured)
    );

    test.service.rotate(test_key("k1"));
    assert!(test.service.verify(&token).is_ok());
}
