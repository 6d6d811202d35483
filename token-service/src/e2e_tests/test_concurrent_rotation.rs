//! Test that verification running alongside rotation never sees a partial
//! key set.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::TokenServiceConfig;
use crate::e2e_tests::helpers::*;
use crate::time::ManualTimeSource;

const VERIFIERS: usize = 8;
const ROUNDS: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
async fn test_verify_during_key_replacement() {
    let service = Arc::new(TokenService::with_time_source(
        TokenServiceConfig::new(vec![test_key("k1")]),
        ManualTimeSource::new(T0),
    ));
    let token = service
        .issue("user-1", crate::auth::ExtraClaims::new(), None)
        .expect("issued");

    let mut verifiers = Vec::with_capacity(VERIFIERS);
    for _ in 0..VERIFIERS {
        let service = Arc::clone(&service);
        let token = token.clone();
        verifiers.push(tokio::spawn(async move {
            for _ in 0..ROUNDS {
                service.verify(&token).expect("k1 is always present");
                tokio::task::yield_now().await;
            }
        }));
    }

    // Every published ring contains k1, so every verification must succeed.
    for round in 0..ROUNDS {
        if round % 2 == 0 {
            service.replace_keys(vec![test_key("k2"), test_key("k3"), test_key("k1")]);
        } else {
            service.replace_keys(vec![test_key("k1")]);
        }
        tokio::task::yield_now().await;
    }

    for verifier in verifiers {
        verifier.await.expect("verifier task panicked");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
async fn test_concurrent_issue_and_verify() {
    let service = Arc::new(TokenService::with_time_source(
        TokenServiceConfig::new(vec![test_key("k1")]),
        ManualTimeSource::new(T0),
    ));

    let mut tasks = Vec::new();
    for worker in 0..VERIFIERS {
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            let subject = format!("user-{worker}");
            for _ in 0..ROUNDS / 4 {
                let token = service
                    .issue(&subject, crate::auth::ExtraClaims::new(), None)
                    .expect("issued");
                let claims = service.verify(&token).expect("verified");
                assert_eq!(claims.subject, subject);
            }
        }));
    }

    for task in tasks {
        task.await.expect("worker task panicked");
    }
}
