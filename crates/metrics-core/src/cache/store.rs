//! In-memory key/value store with a fixed TTL and lazy expiration.
//!
//! Storage is a `mini_moka` cache with no crate-level TTL. Entries are
//! stamped with `tokio::time::Instant` instead, so tests can drive expiry
//! with a paused clock. Nothing sweeps in the background: an expired entry
//! is dropped when a read finds it, or by an explicit
//! [`CacheStore::purge_expired`].

use mini_moka::sync::Cache;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// A cached value together with the moment it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    /// Valid iff `now - inserted_at < ttl`.
    pub fn is_valid_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// Counters for monitoring cache effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub inserts: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    inserts: AtomicU64,
}

/// Generic TTL cache shared by every source adapter.
///
/// No lock is held across an upstream call, so concurrent misses on one key
/// may each go upstream. Writes are whole-value overwrites and the last one
/// wins.
pub struct CacheStore<K, V> {
    ttl: Duration,
    entries: Cache<K, CacheEntry<V>>,
    counters: Counters,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Cache::builder().build(),
            counters: Counters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value if present and unexpired, otherwise a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_valid_at(now, self.ttl) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            Some(_) => {
                self.entries.invalidate(key);
                self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Unconditional overwrite; stamps the entry with the current time.
    pub fn set(&self, key: K, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Serve from cache, or run `fetch` and store its value on success.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) -> bool {
        let present = self.entries.contains_key(key);
        self.entries.invalidate(key);
        present
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_valid_at(now, self.ttl))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &expired {
            self.entries.invalidate(key);
        }
        self.counters
            .expirations
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired.len()
    }

    /// Number of stored entries, expired ones included until they are dropped.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("ttl", &self.ttl)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{CanonicalMetric, Change24h, MetricName};

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_unwritten_key_is_a_miss() {
        let store: CacheStore<String, u32> = CacheStore::new(TTL);
        assert_eq!(store.get(&"missing".to_string()), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_until_ttl_elapses() {
        let store = CacheStore::new(TTL);
        store.set("k", 7u32);

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(store.get(&"k"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(store.get(&"k"), None);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_read_drops_entry() {
        let store = CacheStore::new(TTL);
        store.set("k", 7u32);
        tokio::time::advance(TTL).await;

        // Still stored until something reads it.
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"k"), None);
        assert!(store.is_empty());
        assert!(!store.invalidate(&"k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_restamps_insertion_time() {
        let store = CacheStore::new(TTL);
        store.set("k", 1u32);
        tokio::time::advance(Duration::from_secs(200)).await;
        store.set("k", 2u32);
        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(store.get(&"k"), Some(2));
    }

    #[tokio::test]
    async fn test_canonical_metric_reads_back_unchanged() {
        let store = CacheStore::new(TTL);
        let metric = CanonicalMetric::live(
            MetricName::KtaPrice,
            0.4512,
            Change24h::from_percent(0.4512, 5.4),
            "coingecko",
            Utc::now(),
        );
        store.set(("coingecko", "coins.price"), metric.clone());
        assert_eq!(store.get(&("coingecko", "coins.price")), Some(metric));
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_caches_success_only() {
        let store: CacheStore<&str, u32> = CacheStore::new(TTL);

        let failed: Result<u32, &str> = store
            .get_or_try_insert_with("k", || async { Err("upstream down") })
            .await;
        assert!(failed.is_err());
        assert!(store.is_empty());

        let first: Result<u32, &str> = store.get_or_try_insert_with("k", || async { Ok(5) }).await;
        assert_eq!(first, Ok(5));

        let second: Result<u32, &str> = store
            .get_or_try_insert_with("k", || async { Ok(99) })
            .await;
        assert_eq!(second, Ok(5));
        assert_eq!(store.stats().inserts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = CacheStore::new(TTL);
        store.set("old", 1u32);
        tokio::time::advance(Duration::from_secs(250)).await;
        store.set("new", 2u32);
        tokio::time::advance(Duration::from_secs(60)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"new"), Some(2));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let store = CacheStore::new(TTL);
        store.set("k", 1u32);
        assert!(store.invalidate(&"k"));
        assert!(!store.invalidate(&"k"));
        assert_eq!(store.get(&"k"), None);
    }
}
