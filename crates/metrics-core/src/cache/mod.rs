//! Caching layer shared by every source adapter.
//!
//! One [`MetricsCache`] is built by the composition root and handed to each
//! adapter by `Arc`; there is no process-wide cache singleton.

mod store;

pub use store::{CacheEntry, CacheStats, CacheStore};

use crate::models::{CanonicalMetric, HistoryPoint};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Cache key: `(source id, operation, hash of the request parameters)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source_id: String,
    pub operation: &'static str,
    pub param_hash: String,
}

impl CacheKey {
    pub fn new(source_id: impl Into<String>, operation: &'static str, params: &str) -> Self {
        Self {
            source_id: source_id.into(),
            operation,
            param_hash: hash_params(params),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_id, self.operation, self.param_hash)
    }
}

fn hash_params(params: &str) -> String {
    let hash = blake3::hash(params.as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}

/// The stores owned by one composition root: one per cached value type.
#[derive(Debug)]
pub struct MetricsCache {
    pub metrics: CacheStore<CacheKey, CanonicalMetric>,
    pub history: CacheStore<CacheKey, Vec<HistoryPoint>>,
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            metrics: CacheStore::new(ttl),
            history: CacheStore::new(ttl),
        }
    }

    pub fn stats(&self) -> MetricsCacheStats {
        MetricsCacheStats {
            ttl_secs: self.metrics.ttl().as_secs(),
            metrics: self.metrics.stats(),
            history: self.history.stats(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsCacheStats {
    pub ttl_secs: u64,
    pub metrics: CacheStats,
    pub history: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_hashes_params() {
        let a = CacheKey::new("coingecko", "coins.price", "keeta");
        let b = CacheKey::new("coingecko", "coins.price", "keeta");
        let c = CacheKey::new("coingecko", "coins.price", "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.param_hash.len(), 16);
        assert!(a.to_string().starts_with("coingecko:coins.price:"));
    }
}
