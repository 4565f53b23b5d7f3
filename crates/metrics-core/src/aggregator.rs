//! Snapshot assembly across every configured source.
//!
//! [`MetricsAggregator`] is the composition root: it owns the shared cache,
//! the registered adapters and the fallback provider. A snapshot fans out one
//! task per configured metric and waits for all of them; any failure is
//! replaced by that metric's placeholder, so a snapshot never fails.

use crate::cache::{MetricsCache, MetricsCacheStats};
use crate::config::{HistoryConfig, MetricsConfig};
use crate::error::{FetchError, MetricsError, Result};
use crate::fallback::FallbackProvider;
use crate::models::{CanonicalMetric, HistoryPoint, HistorySeries, MetricName, MetricsSnapshot};
use crate::network::{DynHistorySource, DynSourceAdapter, HttpClient, SourceDescriptor};
use crate::sources::{CoinGeckoClient, DefiLlamaClient};
use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Upstream descriptors used by [`MetricsAggregator::with_descriptors`].
#[derive(Debug, Clone)]
pub struct SourceDescriptors {
    pub coingecko: SourceDescriptor,
    pub defillama: SourceDescriptor,
    pub defillama_stablecoins: SourceDescriptor,
}

impl Default for SourceDescriptors {
    fn default() -> Self {
        Self {
            coingecko: SourceDescriptor::coingecko(),
            defillama: SourceDescriptor::defillama(),
            defillama_stablecoins: SourceDescriptor::defillama_stablecoins(),
        }
    }
}

pub struct MetricsAggregator {
    metrics: Vec<MetricName>,
    adapters: HashMap<MetricName, DynSourceAdapter>,
    history: HashMap<HistorySeries, DynHistorySource>,
    fallback: FallbackProvider,
    call_timeout: Duration,
    cache: Arc<MetricsCache>,
}

impl MetricsAggregator {
    pub fn builder(cache: Arc<MetricsCache>) -> MetricsAggregatorBuilder {
        MetricsAggregatorBuilder::new(cache)
    }

    /// Wire the live providers from configuration.
    pub fn from_config(config: &MetricsConfig) -> Result<Self> {
        Self::with_descriptors(config, &SourceDescriptors::default())
    }

    /// Wire the live providers against the given endpoints.
    pub fn with_descriptors(
        config: &MetricsConfig,
        descriptors: &SourceDescriptors,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(MetricsCache::new(config.ttl));
        let http = Arc::new(HttpClient::with_timeout(config.request_timeout)?);

        let coingecko = Arc::new(CoinGeckoClient::new(
            Arc::clone(&http),
            &descriptors.coingecko,
            config.coingecko_api_key.as_deref(),
            config.token_id.as_str(),
            Arc::clone(&cache),
        ));
        let defillama = Arc::new(DefiLlamaClient::new(
            http,
            &descriptors.defillama,
            &descriptors.defillama_stablecoins,
            config.chain_name.as_str(),
            config.dex_chain.as_str(),
            Arc::clone(&cache),
        ));

        info!(
            "Metrics aggregator configured: {} metrics, ttl {:?}, coingecko {}",
            config.metrics.len(),
            config.ttl,
            if coingecko.is_authenticated() { "authenticated" } else { "public" }
        );

        Ok(Self::builder(cache)
            .metrics(config.metrics.iter().copied())
            .adapters(coingecko.adapters())
            .adapters(defillama.adapters())
            .history_source(coingecko.history_source())
            .history_source(defillama.history_source())
            .call_timeout(config.request_timeout)
            .build())
    }

    /// The metric names every snapshot contains, in catalogue order.
    pub fn configured_metrics(&self) -> &[MetricName] {
        &self.metrics
    }

    pub fn has_adapter(&self, name: MetricName) -> bool {
        self.adapters.contains_key(&name)
    }

    /// Build a snapshot of every configured metric.
    ///
    /// Adapter calls run concurrently as separate tasks, each bounded by the
    /// call timeout. The result always holds exactly the configured names.
    pub async fn build_snapshot(&self) -> MetricsSnapshot {
        let generated_at = Utc::now();

        let calls = self.metrics.iter().map(|&name| {
            let adapter = self.adapters.get(&name).cloned();
            let limit = self.call_timeout;
            async move {
                match adapter {
                    Some(adapter) => (name, Some(run_adapter(adapter, limit).await)),
                    None => (name, None),
                }
            }
        });
        let outcomes = join_all(calls).await;

        let mut metrics = BTreeMap::new();
        for (name, outcome) in outcomes {
            let metric = match outcome {
                Some(Ok(metric)) => metric,
                Some(Err(err)) => {
                    debug!("{}: serving fallback after {} ({})", name, err.kind(), err);
                    self.fallback.placeholder_at(name, generated_at)
                }
                None => {
                    debug!("{}: no live source, serving fallback", name);
                    self.fallback.placeholder_at(name, generated_at)
                }
            };
            metrics.insert(name, metric);
        }

        let snapshot = MetricsSnapshot::new(generated_at, metrics);
        debug!(
            "Snapshot built: {} metrics, {} fallback",
            snapshot.len(),
            snapshot.fallback_count()
        );
        snapshot
    }

    /// Daily history for `series` over the last `days` days.
    pub async fn history(&self, series: HistorySeries, days: u32) -> Result<Vec<HistoryPoint>> {
        if days == 0 || days > HistoryConfig::MAX_DAYS {
            return Err(MetricsError::InvalidParams {
                message: format!(
                    "days must be between 1 and {}, got {}",
                    HistoryConfig::MAX_DAYS,
                    days
                ),
            });
        }
        let source = self.history.get(&series).ok_or_else(|| MetricsError::InvalidParams {
            message: format!("no history source registered for {}", series),
        })?;

        match tokio::time::timeout(self.call_timeout, source.fetch_history(days)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FetchError::transient(
                source.source_id(),
                format!("{} history timed out after {:?}", series, self.call_timeout),
            )
            .into()),
        }
    }

    pub fn cache(&self) -> &Arc<MetricsCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> MetricsCacheStats {
        self.cache.stats()
    }
}

/// Run one adapter in its own task so a panic stays contained.
///
/// On timeout the task is left to finish on its own; a late success still
/// lands in the cache for the next snapshot.
async fn run_adapter(
    adapter: DynSourceAdapter,
    limit: Duration,
) -> std::result::Result<CanonicalMetric, FetchError> {
    let source_id = adapter.source_id().to_string();
    let metric = adapter.metric();
    let task = tokio::spawn(async move { adapter.fetch().await });

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(FetchError::transient(
            source_id,
            format!("{} task failed: {}", metric, join_err),
        )),
        Err(_) => Err(FetchError::transient(
            source_id,
            format!("{} timed out after {:?}", metric, limit),
        )),
    }
}

/// Builder for [`MetricsAggregator`].
pub struct MetricsAggregatorBuilder {
    metrics: Vec<MetricName>,
    adapters: HashMap<MetricName, DynSourceAdapter>,
    history: HashMap<HistorySeries, DynHistorySource>,
    call_timeout: Duration,
    cache: Arc<MetricsCache>,
}

impl MetricsAggregatorBuilder {
    fn new(cache: Arc<MetricsCache>) -> Self {
        Self {
            metrics: MetricName::LIVE.to_vec(),
            adapters: HashMap::new(),
            history: HashMap::new(),
            call_timeout: crate::config::NetworkConfig::REQUEST_TIMEOUT,
            cache,
        }
    }

    /// Replace the configured metric set. Duplicates are dropped.
    pub fn metrics(mut self, names: impl IntoIterator<Item = MetricName>) -> Self {
        let mut names: Vec<MetricName> = names.into_iter().collect();
        names.sort();
        names.dedup();
        self.metrics = names;
        self
    }

    /// Register an adapter; a later adapter for the same metric replaces it.
    pub fn adapter(mut self, adapter: DynSourceAdapter) -> Self {
        if let Some(previous) = self.adapters.insert(adapter.metric(), adapter) {
            debug!(
                "{}: replacing adapter from {}",
                previous.metric(),
                previous.source_id()
            );
        }
        self
    }

    pub fn adapters(self, adapters: impl IntoIterator<Item = DynSourceAdapter>) -> Self {
        adapters.into_iter().fold(self, |builder, adapter| builder.adapter(adapter))
    }

    pub fn history_source(mut self, source: DynHistorySource) -> Self {
        self.history.insert(source.series(), source);
        self
    }

    /// Upper bound on each adapter call.
    pub fn call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = limit;
        self
    }

    pub fn build(self) -> MetricsAggregator {
        MetricsAggregator {
            metrics: self.metrics,
            adapters: self.adapters,
            history: self.history,
            fallback: FallbackProvider::new(),
            call_timeout: self.call_timeout,
            cache: self.cache,
        }
    }
}
