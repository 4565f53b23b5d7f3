//! CoinGecko response schemas and their normalized form.

use crate::error::FetchError;
use crate::models::HistoryPoint;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /coins/{id}` with `market_data=true`. Unused fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinResponse {
    pub id: String,
    pub market_data: MarketData,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    pub current_price: UsdQuote,
    pub market_cap: UsdQuote,
    #[serde(default)]
    pub fully_diluted_valuation: Option<UsdQuote>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h: Option<f64>,
}

/// Per-currency quote object; only the USD leg is read.
#[derive(Debug, Clone, Deserialize)]
pub struct UsdQuote {
    #[serde(default)]
    pub usd: Option<f64>,
}

/// `GET /coins/{id}/market_chart`: `prices` is `[[unix_ms, price], ...]`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<(f64, f64)>,
}

/// Token market figures after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMarketData {
    pub id: String,
    pub price_usd: f64,
    pub price_change_24h: f64,
    pub price_change_percentage_24h: f64,
    pub market_cap_usd: f64,
    pub market_cap_change_24h: f64,
    pub market_cap_change_percentage_24h: f64,
    pub fully_diluted_valuation_usd: f64,
    pub last_updated: DateTime<Utc>,
}

impl TokenMarketData {
    /// Validate the raw response. Price and market cap are required; a
    /// missing FDV reads as zero and missing 24h deltas read as no change.
    pub fn from_response(source_id: &str, raw: CoinResponse) -> Result<Self, FetchError> {
        let md = raw.market_data;
        let price_usd = md
            .current_price
            .usd
            .ok_or_else(|| {
                FetchError::schema(source_id, "market_data.current_price.usd missing").logged()
            })?;
        let market_cap_usd = md
            .market_cap
            .usd
            .ok_or_else(|| {
                FetchError::schema(source_id, "market_data.market_cap.usd missing").logged()
            })?;

        Ok(Self {
            id: raw.id,
            price_usd,
            price_change_24h: md.price_change_24h.unwrap_or(0.0),
            price_change_percentage_24h: md.price_change_percentage_24h.unwrap_or(0.0),
            market_cap_usd,
            market_cap_change_24h: md.market_cap_change_24h.unwrap_or(0.0),
            market_cap_change_percentage_24h: md.market_cap_change_percentage_24h.unwrap_or(0.0),
            fully_diluted_valuation_usd: md
                .fully_diluted_valuation
                .and_then(|q| q.usd)
                .unwrap_or(0.0),
            last_updated: raw.last_updated.unwrap_or_else(Utc::now),
        })
    }
}

impl MarketChartResponse {
    pub fn into_points(self, source_id: &str) -> Result<Vec<HistoryPoint>, FetchError> {
        self.prices
            .into_iter()
            .map(|(millis, price)| {
                DateTime::from_timestamp_millis(millis as i64)
                    .map(|timestamp| HistoryPoint {
                        timestamp,
                        value: price,
                    })
                    .ok_or_else(|| {
                        FetchError::schema(source_id, format!("invalid timestamp {}", millis))
                            .logged()
                    })
            })
            .collect()
    }
}
