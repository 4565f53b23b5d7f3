//! Upstream providers.
//!
//! Each provider module owns its response schemas and exposes a client that
//! hands out [`SourceAdapter`](crate::network::SourceAdapter)s, one per
//! metric it can produce.

pub mod coingecko;
pub mod defillama;

pub use coingecko::{CoinGeckoClient, TokenMetric, TokenMetricAdapter};
pub use defillama::{ChainMetric, ChainMetricAdapter, DefiLlamaClient};
