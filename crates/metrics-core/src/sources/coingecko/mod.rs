//! CoinGecko token market source.
//!
//! One [`CoinGeckoClient`] serves three metric adapters (price, market cap,
//! FDV) and the price history series. Each adapter caches its own metric, so
//! a cold snapshot issues one `/coins/{id}` request per token metric.

mod types;

pub use types::{CoinResponse, MarketChartResponse, MarketData, TokenMarketData, UsdQuote};

use crate::cache::{CacheKey, MetricsCache};
use crate::error::FetchError;
use crate::models::{CanonicalMetric, Change24h, HistoryPoint, HistorySeries, MetricName};
use crate::network::{
    DynHistorySource, DynSourceAdapter, HistorySource, HttpClient, ResolvedEndpoint,
    SourceAdapter, SourceDescriptor,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const COIN_QUERY: &str = "localization=false&tickers=false&market_data=true\
&community_data=false&developer_data=false&sparkline=false";

/// Client for the token market endpoints.
pub struct CoinGeckoClient {
    http: Arc<HttpClient>,
    endpoint: ResolvedEndpoint,
    token_id: String,
    cache: Arc<MetricsCache>,
}

impl CoinGeckoClient {
    pub fn new(
        http: Arc<HttpClient>,
        descriptor: &SourceDescriptor,
        api_key: Option<&str>,
        token_id: impl Into<String>,
        cache: Arc<MetricsCache>,
    ) -> Self {
        let endpoint = descriptor.resolve(api_key);
        debug!(
            "{}: using {} endpoint {}",
            endpoint.source_id,
            if endpoint.is_authenticated() { "authenticated" } else { "public" },
            endpoint.base_url
        );
        Self {
            http,
            endpoint,
            token_id: token_id.into(),
            cache,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.endpoint.source_id
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.endpoint.is_authenticated()
    }

    /// Fetch and validate the token's market data. Not cached.
    pub async fn fetch_market_data(&self) -> Result<TokenMarketData, FetchError> {
        let url = self.endpoint.url(&format!(
            "coins/{}?{}",
            urlencoding::encode(&self.token_id),
            COIN_QUERY
        ));
        let raw: CoinResponse = self
            .http
            .get_json(
                self.source_id(),
                &format!("coin {}", self.token_id),
                &url,
                &self.endpoint.headers(),
            )
            .await?;
        TokenMarketData::from_response(self.source_id(), raw)
    }

    /// Daily USD prices for the last `days` days, cached per `(token, days)`.
    pub async fn price_history(&self, days: u32) -> Result<Vec<HistoryPoint>, FetchError> {
        let key = CacheKey::new(
            self.source_id(),
            "coins.market_chart",
            &format!("{}:{}", self.token_id, days),
        );
        self.cache
            .history
            .get_or_try_insert_with(key, || async move {
                let url = self.endpoint.url(&format!(
                    "coins/{}/market_chart?vs_currency=usd&days={}&interval=daily",
                    urlencoding::encode(&self.token_id),
                    days
                ));
                let raw: MarketChartResponse = self
                    .http
                    .get_json(
                        self.source_id(),
                        &format!("price history for {}", self.token_id),
                        &url,
                        &self.endpoint.headers(),
                    )
                    .await?;
                raw.into_points(self.source_id())
            })
            .await
    }

    /// One adapter per token metric.
    pub fn adapters(self: &Arc<Self>) -> Vec<DynSourceAdapter> {
        TokenMetric::ALL
            .iter()
            .map(|&field| {
                Arc::new(TokenMetricAdapter::new(Arc::clone(self), field)) as DynSourceAdapter
            })
            .collect()
    }

    pub fn history_source(self: &Arc<Self>) -> DynHistorySource {
        Arc::new(PriceHistorySource {
            client: Arc::clone(self),
        })
    }
}

/// Token metrics derivable from `/coins/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMetric {
    Price,
    MarketCap,
    FullyDilutedValuation,
}

impl TokenMetric {
    pub const ALL: [TokenMetric; 3] = [
        TokenMetric::Price,
        TokenMetric::MarketCap,
        TokenMetric::FullyDilutedValuation,
    ];

    pub fn metric(&self) -> MetricName {
        match self {
            TokenMetric::Price => MetricName::KtaPrice,
            TokenMetric::MarketCap => MetricName::KtaMarketCap,
            TokenMetric::FullyDilutedValuation => MetricName::KtaFdv,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            TokenMetric::Price => "coins.price",
            TokenMetric::MarketCap => "coins.market_cap",
            TokenMetric::FullyDilutedValuation => "coins.fdv",
        }
    }

    /// Pick this metric's value and 24h change out of the market data.
    pub fn extract(&self, data: &TokenMarketData) -> (f64, Change24h) {
        match self {
            TokenMetric::Price => (
                data.price_usd,
                Change24h {
                    absolute: data.price_change_24h,
                    percent: data.price_change_percentage_24h,
                },
            ),
            TokenMetric::MarketCap => (
                data.market_cap_usd,
                Change24h {
                    absolute: data.market_cap_change_24h,
                    percent: data.market_cap_change_percentage_24h,
                },
            ),
            // FDV has no delta of its own; it moves with the price.
            TokenMetric::FullyDilutedValuation => (
                data.fully_diluted_valuation_usd,
                Change24h::from_percent(
                    data.fully_diluted_valuation_usd,
                    data.price_change_percentage_24h,
                ),
            ),
        }
    }
}

/// Cached adapter for one token metric.
pub struct TokenMetricAdapter {
    client: Arc<CoinGeckoClient>,
    field: TokenMetric,
}

impl TokenMetricAdapter {
    pub fn new(client: Arc<CoinGeckoClient>, field: TokenMetric) -> Self {
        Self { client, field }
    }
}

#[async_trait]
impl SourceAdapter for TokenMetricAdapter {
    fn source_id(&self) -> &str {
        self.client.source_id()
    }

    fn metric(&self) -> MetricName {
        self.field.metric()
    }

    async fn fetch(&self) -> Result<CanonicalMetric, FetchError> {
        let key = CacheKey::new(self.source_id(), self.field.operation(), self.client.token_id());
        self.client
            .cache
            .metrics
            .get_or_try_insert_with(key, || async move {
                debug!("{}: cache miss for {}", self.source_id(), self.metric());
                let data = self.client.fetch_market_data().await?;
                let (value, change) = self.field.extract(&data);
                Ok(CanonicalMetric::live(
                    self.metric(),
                    value,
                    change,
                    self.source_id(),
                    data.last_updated,
                ))
            })
            .await
    }
}

struct PriceHistorySource {
    client: Arc<CoinGeckoClient>,
}

#[async_trait]
impl HistorySource for PriceHistorySource {
    fn source_id(&self) -> &str {
        self.client.source_id()
    }

    fn series(&self) -> HistorySeries {
        HistorySeries::TokenPrice
    }

    async fn fetch_history(&self, days: u32) -> Result<Vec<HistoryPoint>, FetchError> {
        self.client.price_history(days).await
    }
}
