//! End-to-end tests at the token issue/verify level.
//!
//! Each test file covers a specific scenario, using a manually driven clock
//! so expiry is deterministic.

#![cfg(test)]

mod helpers;

mod test_concurrent_rotation;
mod test_distinct_tokens;
mod test_expiry;
mod test_issue_verify;
mod test_key_rotation;
