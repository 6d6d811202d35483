//! Time source abstraction for token issuance and expiry checks.
//!
//! This module provides a `TimeSource` trait that abstracts over "now",
//! allowing the service to use the real system clock in production and a
//! manually driven clock in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over time operations.
///
/// Implementations must be safe to share across request-handling tasks.
pub trait TimeSource: Send + Sync {
    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Real time source using the system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        // A clock set before 1970 reads as the epoch; every token issued
        // against it is already expired, which is the safe direction.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// A manually driven time source.
///
/// Time only moves when told to. Clones share the same underlying clock, so
/// a test can hand one clone to a `TokenService` and advance the other.
///
/// # Example
///
/// ```
/// use token_service::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1_000);
/// let shared = time.clone();
///
/// time.advance(60);
/// assert_eq!(shared.now_secs(), 1_060);
/// ```
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    /// Current time in seconds since Unix epoch.
    current_secs: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Create a new manual time source starting at `initial_secs`.
    #[must_use]
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current_secs: Arc::new(AtomicU64::new(initial_secs)),
        }
    }

    /// Create a manual time source starting at `1_700_000_000`
    /// (approximately November 2023).
    #[must_use]
    pub fn default_start() -> Self {
        Self::new(1_700_000_000)
    }

    /// Advance time by `secs` seconds, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        // fetch_update only fails when the closure returns None.
        let _ = self
            .current_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(secs))
            });
    }

    /// Set the current time to `secs`. May move time backwards.
    pub fn set(&self, secs: u64) {
        self.current_secs.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> u64 {
        self.current_secs.load(Ordering::SeqCst)
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::default_start()
    }
}
