//! Signing key ring and its atomically published snapshots.
//!
//! # Pre-conditions
//! - Keys are supplied newest first.
//!
//! # Post-conditions
//! - A ring never holds more keys than its retention limit, whether it was
//!   built from a list or produced by rotation.
//! - Readers always observe a complete `KeyRing`; a rotation is visible to a
//!   reader either entirely or not at all.
//!
//! # Invariants
//! - Key ids within a ring are unique.
//! - The first key in a ring is the active issuance key.

use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::signing_key::{SigningAlgorithm, SigningKey};

/// An immutable, ordered set of signing keys, newest first.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<SigningKey>,
}

impl KeyRing {
    /// Build a ring from keys ordered newest first, keeping at most
    /// `max_keys` of them (at least one).
    ///
    /// Later keys whose id repeats an earlier one are dropped, and so are
    /// the oldest keys beyond the limit.
    #[must_use]
    pub fn new(keys: Vec<SigningKey>, max_keys: usize) -> Self {
        let max_keys = max_keys.max(1);
        let mut unique: Vec<SigningKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if unique.iter().any(|k| k.key_id() == key.key_id()) {
                tracing::warn!(key_id = %key.key_id(), "ignoring duplicate signing key id");
                continue;
            }
            unique.push(key);
        }

        if unique.len() > max_keys {
            let dropped: Vec<&str> = unique[max_keys..].iter().map(SigningKey::key_id).collect();
            tracing::warn!(
                max_keys,
                dropped = ?dropped,
                "dropping signing keys beyond the retention limit"
            );
            unique.truncate(max_keys);
        }

        Self { keys: unique }
    }

    /// The key new tokens are signed with.
    #[must_use]
    pub fn active(&self) -> Option<&SigningKey> {
        self.keys.first()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids, newest first.
    #[must_use]
    pub fn key_ids(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.key_id().to_string()).collect()
    }

    /// Keys that could have produced a signature with `algorithm`.
    ///
    /// The key named by `key_id` (if any) comes first, followed by every
    /// other key with the same algorithm, newest first.
    #[must_use]
    pub fn candidates(&self, algorithm: SigningAlgorithm, key_id: Option<&str>) -> Vec<&SigningKey> {
        let mut matching: Vec<&SigningKey> = self
            .keys
            .iter()
            .filter(|k| k.algorithm() == algorithm)
            .collect();

        if let Some(kid) = key_id {
            if let Some(position) = matching.iter().position(|k| k.key_id() == kid) {
                let preferred = matching.remove(position);
                matching.insert(0, preferred);
            }
        }

        matching
    }

    /// A new ring with `key` in front and at most `max_keys` keys.
    ///
    /// An existing key with the same id is replaced.
    #[must_use]
    pub fn rotated(&self, key: SigningKey, max_keys: usize) -> Self {
        let key_id = key.key_id().to_string();
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.push(key);
        keys.extend(self.keys.iter().filter(|k| k.key_id() != key_id).cloned());
        keys.truncate(max_keys.max(1));
        Self { keys }
    }

    /// A new ring without `key_id`, or `None` if the key is not present.
    #[must_use]
    pub fn without(&self, key_id: &str) -> Option<Self> {
        if !self.keys.iter().any(|k| k.key_id() == key_id) {
            return None;
        }
        Some(Self {
            keys: self
                .keys
                .iter()
                .filter(|k| k.key_id() != key_id)
                .cloned()
                .collect(),
        })
    }
}

/// Thread-safe holder of the current `KeyRing` snapshot.
///
/// # Thread Safety
///
/// Readers take the read lock only long enough to clone the `Arc`. Writers
/// build the replacement ring first and then swap it in under the write
/// lock, so the lock never guards a half-built ring. A poisoned lock still
/// holds a complete ring and is recovered rather than propagated.
#[derive(Debug)]
pub struct KeyStore {
    current: RwLock<Arc<KeyRing>>,
    max_keys: usize,
}

impl KeyStore {
    /// Create a store holding `keys` (newest first), retaining at most
    /// `max_keys` of them now and after every rotation.
    #[must_use]
    pub fn new(keys: Vec<SigningKey>, max_keys: usize) -> Self {
        let max_keys = max_keys.max(1);
        Self {
            current: RwLock::new(Arc::new(KeyRing::new(keys, max_keys))),
            max_keys,
        }
    }

    /// The current snapshot.
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is the point of the snapshot
    pub fn snapshot(&self) -> Arc<KeyRing> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish a ring built from `keys` (newest first) under the retention
    /// limit. Returns the key ids of the published ring.
    pub fn replace(&self, keys: Vec<SigningKey>) -> Vec<String> {
        let ring = KeyRing::new(keys, self.max_keys);
        let key_ids = ring.key_ids();
        let ring = Arc::new(ring);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = ring;
        key_ids
    }

    /// Put `key` in front of the ring, dropping the oldest keys beyond the
    /// retention limit. Returns the key ids of the published ring.
    pub fn rotate(&self, key: SigningKey) -> Vec<String> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.rotated(key, self.max_keys);
        let key_ids = next.key_ids();
        *guard = Arc::new(next);
        key_ids
    }

    /// Remove `key_id` from the ring. Returns whether it was present.
    pub fn retire(&self, key_id: &str) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match guard.without(key_id) {
            Some(next) => {
                *guard = Arc::new(next);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn max_keys(&self) -> usize {
        self.max_keys
    }
}
