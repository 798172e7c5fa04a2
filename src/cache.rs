//! Short-lived in-memory cache for upstream API responses.
//!
//! Entries carry an absolute expiry and are removed lazily: an expired entry
//! survives in the map until the next read for its key. There is no
//! background sweep and no capacity bound; the cache lives only as long as
//! the process. Both limitations are deliberate and documented, so callers
//! should not "fix" them here without changing the contract.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Fixed lifetime of every cache entry. There is no per-entry override.
pub const CACHE_TTL: Duration = Duration::from_millis(300_000);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key/value store with per-entry absolute expiry.
///
/// A single mutex guards the whole map so the get-check-delete sequence is
/// atomic even when request handlers run on multiple runtime threads.
/// Values are cloned out on read; the caller owns its copy and cannot
/// corrupt later reads through it.
pub struct ResponseCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the stored value for `key`, or `None` when no entry exists or
    /// the entry has expired. Expiry is exclusive: an entry set at `t` with
    /// TTL `w` is already absent for a read at exactly `t + w`, and the
    /// expired entry is deleted before returning.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, overwriting any existing entry and
    /// resetting its expiry to now + [`CACHE_TTL`].
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, CACHE_TTL);
    }

    fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Number of stored entries, expired-but-not-yet-read ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
