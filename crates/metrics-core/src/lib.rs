//! Keeta Metrics - Headless aggregation and caching of network and token metrics.
//!
//! This crate fetches on-chain and market metrics from public providers,
//! normalizes them into [`CanonicalMetric`]s, caches them for a fixed TTL and
//! assembles snapshots that never fail: any metric whose source is down is
//! replaced by a documented placeholder flagged `is_fallback`.
//!
//! It can be used programmatically without any HTTP/RPC layer; see the
//! `keeta-metrics-rpc` crate for the JSON-RPC server.
//!
//! # Example
//!
//! ```rust,ignore
//! use keeta_metrics::{MetricsAggregator, MetricsConfig};
//!
//! #[tokio::main]
//! async fn main() -> keeta_metrics::Result<()> {
//!     let config = MetricsConfig::from_env()?;
//!     let aggregator = MetricsAggregator::from_config(&config)?;
//!
//!     let snapshot = aggregator.build_snapshot().await;
//!     for metric in snapshot.metrics.values() {
//!         println!("{}: {} ({})", metric.name, metric.display_string, metric.change_display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod format;
pub mod models;
pub mod network;
pub mod sources;

// Re-export commonly used types
pub use aggregator::{MetricsAggregator, MetricsAggregatorBuilder, SourceDescriptors};
pub use cache::{CacheKey, CacheStats, CacheStore, MetricsCache, MetricsCacheStats};
pub use config::{HistoryConfig, MetricsConfig};
pub use error::{FetchError, FetchErrorKind, MetricsError, Result};
pub use fallback::{FallbackProvider, FALLBACK_SOURCE_ID};
pub use models::{
    CanonicalMetric, Change24h, HistoryPoint, HistorySeries, MetricKind, MetricName,
    MetricsSnapshot,
};
pub use network::{
    DynHistorySource, DynSourceAdapter, HistorySource, HttpClient, SourceAdapter,
    SourceDescriptor,
};
