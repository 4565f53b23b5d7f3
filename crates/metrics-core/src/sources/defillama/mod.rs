//! DefiLlama chain-level sources: TVL, stablecoin supply, DEX volume and
//! TVL history. DefiLlama is public only, so no key is ever sent.

mod types;

pub use types::{
    find_chain, ChainTvlEntry, DexOverview, HistoricalTvlPoint, PeggedAmount,
    StablecoinChainEntry,
};

use crate::cache::{CacheKey, MetricsCache};
use crate::error::FetchError;
use crate::models::{CanonicalMetric, Change24h, HistoryPoint, HistorySeries, MetricName};
use crate::network::{
    DynHistorySource, DynSourceAdapter, HistorySource, HttpClient, ResolvedEndpoint,
    SourceAdapter, SourceDescriptor,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Client for the DefiLlama chain and stablecoin APIs.
pub struct DefiLlamaClient {
    http: Arc<HttpClient>,
    chains: ResolvedEndpoint,
    stablecoins: ResolvedEndpoint,
    chain_name: String,
    dex_chain: String,
    cache: Arc<MetricsCache>,
}

impl DefiLlamaClient {
    pub fn new(
        http: Arc<HttpClient>,
        chains: &SourceDescriptor,
        stablecoins: &SourceDescriptor,
        chain_name: impl Into<String>,
        dex_chain: impl Into<String>,
        cache: Arc<MetricsCache>,
    ) -> Self {
        Self {
            http,
            chains: chains.resolve(None),
            stablecoins: stablecoins.resolve(None),
            chain_name: chain_name.into(),
            dex_chain: dex_chain.into(),
            cache,
        }
    }

    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    /// TVL of the configured chain from the chain listing.
    pub async fn fetch_chain_tvl(&self) -> Result<(f64, Change24h), FetchError> {
        let source_id = self.chains.source_id.as_str();
        let entries: Vec<ChainTvlEntry> = self
            .http
            .get_json(source_id, "chain list", &self.chains.url("v2/chains"), &[])
            .await?;
        let entry = find_chain(&entries, &self.chain_name, |e| e.name.as_str())
            .ok_or_else(|| {
                FetchError::not_found(source_id, format!("chain {}", self.chain_name)).logged()
            })?;
        debug!("{}: matched chain {} in {} entries", source_id, entry.name, entries.len());
        Ok((entry.tvl, entry.change_24h()))
    }

    /// Stablecoin supply on the configured chain.
    pub async fn fetch_stablecoins(&self) -> Result<(f64, Change24h), FetchError> {
        let source_id = self.stablecoins.source_id.as_str();
        let entries: Vec<StablecoinChainEntry> = self
            .http
            .get_json(
                source_id,
                "stablecoin chain list",
                &self.stablecoins.url("stablecoinchains"),
                &[],
            )
            .await?;
        let entry = find_chain(&entries, &self.chain_name, |e| e.name.as_str())
            .ok_or_else(|| {
                FetchError::not_found(source_id, format!("chain {}", self.chain_name)).logged()
            })?;
        let current = entry.circulating(source_id)?;
        Ok((current, entry.change_24h(current)))
    }

    /// DEX volume over the last 24 hours.
    pub async fn fetch_dex_volume(&self) -> Result<(f64, Change24h), FetchError> {
        let source_id = self.chains.source_id.as_str();
        let url = self.chains.url(&format!(
            "overview/dexs/{}?excludeTotalDataChart=true&excludeTotalDataChartBreakdown=true",
            urlencoding::encode(&self.dex_chain)
        ));
        let overview: DexOverview = self
            .http
            .get_json(source_id, &format!("dex overview for {}", self.dex_chain), &url, &[])
            .await?;
        overview.volume_24h(source_id)
    }

    /// Daily chain TVL, keeping the last `days` points. Cached per `(chain, days)`.
    pub async fn tvl_history(&self, days: u32) -> Result<Vec<HistoryPoint>, FetchError> {
        let source_id = self.chains.source_id.as_str();
        let key = CacheKey::new(
            source_id,
            "chains.tvl_history",
            &format!("{}:{}", self.chain_name.to_lowercase(), days),
        );
        self.cache
            .history
            .get_or_try_insert_with(key, || async move {
                let url = self.chains.url(&format!(
                    "v2/historicalChainTvl/{}",
                    urlencoding::encode(&self.chain_name)
                ));
                let raw: Vec<HistoricalTvlPoint> = self
                    .http
                    .get_json(
                        source_id,
                        &format!("tvl history for {}", self.chain_name),
                        &url,
                        &[],
                    )
                    .await?;
                let skip = raw.len().saturating_sub(days as usize);
                raw.into_iter()
                    .skip(skip)
                    .map(|point| point.into_point(source_id))
                    .collect()
            })
            .await
    }

    /// One adapter per chain metric.
    pub fn adapters(self: &Arc<Self>) -> Vec<DynSourceAdapter> {
        ChainMetric::ALL
            .iter()
            .map(|&field| {
                Arc::new(ChainMetricAdapter::new(Arc::clone(self), field)) as DynSourceAdapter
            })
            .collect()
    }

    pub fn history_source(self: &Arc<Self>) -> DynHistorySource {
        Arc::new(TvlHistorySource {
            client: Arc::clone(self),
        })
    }
}

/// Chain metrics served by DefiLlama.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMetric {
    Tvl,
    Stablecoins,
    DexVolume,
}

impl ChainMetric {
    pub const ALL: [ChainMetric; 3] = [
        ChainMetric::Tvl,
        ChainMetric::Stablecoins,
        ChainMetric::DexVolume,
    ];

    pub fn metric(&self) -> MetricName {
        match self {
            ChainMetric::Tvl => MetricName::Tvl,
            ChainMetric::Stablecoins => MetricName::StablecoinsMcap,
            ChainMetric::DexVolume => MetricName::DexVolume24h,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            ChainMetric::Tvl => "chains.tvl",
            ChainMetric::Stablecoins => "stablecoins.circulating",
            ChainMetric::DexVolume => "dexs.volume_24h",
        }
    }
}

/// Cached adapter for one chain metric.
pub struct ChainMetricAdapter {
    client: Arc<DefiLlamaClient>,
    field: ChainMetric,
}

impl ChainMetricAdapter {
    pub fn new(client: Arc<DefiLlamaClient>, field: ChainMetric) -> Self {
        Self { client, field }
    }

    fn endpoint(&self) -> &ResolvedEndpoint {
        match self.field {
            ChainMetric::Stablecoins => &self.client.stablecoins,
            ChainMetric::Tvl | ChainMetric::DexVolume => &self.client.chains,
        }
    }

    fn params(&self) -> String {
        match self.field {
            ChainMetric::DexVolume => self.client.dex_chain.to_lowercase(),
            ChainMetric::Tvl | ChainMetric::Stablecoins => self.client.chain_name.to_lowercase(),
        }
    }
}

#[async_trait]
impl SourceAdapter for ChainMetricAdapter {
    fn source_id(&self) -> &str {
        &self.endpoint().source_id
    }

    fn metric(&self) -> MetricName {
        self.field.metric()
    }

    async fn fetch(&self) -> Result<CanonicalMetric, FetchError> {
        let key = CacheKey::new(self.source_id(), self.field.operation(), &self.params());
        self.client
            .cache
            .metrics
            .get_or_try_insert_with(key, || async move {
                debug!("{}: cache miss for {}", self.source_id(), self.metric());
                let (value, change) = match self.field {
                    ChainMetric::Tvl => self.client.fetch_chain_tvl().await?,
                    ChainMetric::Stablecoins => self.client.fetch_stablecoins().await?,
                    ChainMetric::DexVolume => self.client.fetch_dex_volume().await?,
                };
                Ok(CanonicalMetric::live(
                    self.metric(),
                    value,
                    change,
                    self.source_id(),
                    Utc::now(),
                ))
            })
            .await
    }
}

struct TvlHistorySource {
    client: Arc<DefiLlamaClient>,
}

#[async_trait]
impl HistorySource for TvlHistorySource {
    fn source_id(&self) -> &str {
        &self.client.chains.source_id
    }

    fn series(&self) -> HistorySeries {
        HistorySeries::ChainTvl
    }

    async fn fetch_history(&self, days: u32) -> Result<Vec<HistoryPoint>, FetchError> {
        self.client.tvl_history(days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> Arc<DefiLlamaClient> {
        let http = Arc::new(HttpClient::with_timeout(Duration::from_secs(1)).unwrap());
        let cache = Arc::new(MetricsCache::new(Duration::from_secs(60)));
        Arc::new(DefiLlamaClient::new(
            http,
            &SourceDescriptor::defillama(),
            &SourceDescriptor::defillama_stablecoins(),
            "Keeta",
            "keeta",
            cache,
        ))
    }

    #[test]
    fn test_adapters_cover_chain_metrics() {
        let adapters = client().adapters();
        let metrics: Vec<MetricName> = adapters.iter().map(|a| a.metric()).collect();
        assert_eq!(
            metrics,
            vec![MetricName::Tvl, MetricName::StablecoinsMcap, MetricName::DexVolume24h]
        );
        let sources: Vec<&str> = adapters.iter().map(|a| a.source_id()).collect();
        assert_eq!(sources, vec!["defillama", "defillama-stablecoins", "defillama"]);
    }

    #[test]
    fn test_history_source_series() {
        let source = client().history_source();
        assert_eq!(source.series(), HistorySeries::ChainTvl);
        assert_eq!(source.source_id(), "defillama");
    }
}
