// Session token issuance core shared by the API services.
//
// Life of a token:
// 1. The HTTP layer authenticates a user and calls `TokenService::issue`
// 2. The client presents the token on later requests
// 3. The HTTP layer calls `TokenService::verify` and maps any `TokenError`
//    to a response via `IntoResponse`
//
// System components:
//  - Key ring with atomic rotation
//  - JWS codec
//  - Explicit configuration and an injectable time source

pub mod auth;
pub mod config;
pub mod time;

#[cfg(test)]
mod e2e_tests;

pub use auth::{Claims, ExtraClaims, TokenError, TokenService};
pub use config::TokenServiceConfig;
