//! Short historical series, kept only for the cache window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which series a history request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySeries {
    /// Daily token price in USD.
    TokenPrice,
    /// Daily chain total value locked in USD.
    ChainTvl,
}

impl HistorySeries {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorySeries::TokenPrice => "token_price",
            HistorySeries::ChainTvl => "chain_tvl",
        }
    }
}

impl fmt::Display for HistorySeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
