//! TTL-tagged key/value cache
//!
//! Entries are stamped when written and never evicted. Age is only used to
//! decide whether a refresh should be attempted: an entry past its `max_age`
//! is still returned by [`Cache::get`], which is what lets the key manager
//! serve stale keys while an issuer is unreachable.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Cached value with its creation time
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    created_at: Instant,
    value: V,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            created_at: Instant::now(),
            value,
        }
    }

    fn is_older_than(&self, max_age: Duration) -> bool {
        // `checked_add` only fails for absurd max ages, which never expire
        self.created_at
            .checked_add(max_age)
            .is_some_and(|deadline| Instant::now() > deadline)
    }
}

/// Concurrency-safe TTL cache
///
/// A single reader/writer lock guards the whole map. Reads run concurrently;
/// a write excludes everything else for the duration of an in-memory insert.
///
/// # Example
///
/// ```rust
/// use authentic::cache::Cache;
/// use std::time::Duration;
///
/// let cache = Cache::new(Duration::from_secs(60));
/// let key = Cache::<u32>::key_for("https://auth.example.com/", "key-1");
///
/// assert!(cache.is_expired(&key));
/// cache.set(key.clone(), 7);
/// assert_eq!(cache.get(&key), Some(7));
/// assert!(!cache.is_expired(&key));
/// ```
#[derive(Debug)]
pub struct Cache<V> {
    data: RwLock<HashMap<String, CacheEntry<V>>>,
    max_age: Duration,
}

impl<V: Clone> Cache<V> {
    /// Create an empty cache whose entries go stale after `max_age`
    pub fn new(max_age: Duration) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            max_age,
        }
    }

    /// Composite key for an issuer's key id
    pub fn key_for(issuer: &str, kid: &str) -> String {
        format!("{issuer}/{kid}")
    }

    /// Get a value, stale or not
    pub fn get(&self, key: &str) -> Option<V> {
        self.data.read().get(key).map(|entry| entry.value.clone())
    }

    /// Insert or replace a value, stamping it with the current time
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry::new(value);
        self.data.write().insert(key.into(), entry);
    }

    /// Insert or replace a batch of values under one write lock
    pub fn set_all<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let entries: Vec<(String, CacheEntry<V>)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), CacheEntry::new(value)))
            .collect();

        let mut data = self.data.write();
        data.extend(entries);
    }

    /// Whether a refresh should be attempted for `key`
    ///
    /// Missing keys are always expired.
    pub fn is_expired(&self, key: &str) -> bool {
        match self.data.read().get(key) {
            Some(entry) => entry.is_older_than(self.max_age),
            None => true,
        }
    }

    /// Configured freshness window
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
