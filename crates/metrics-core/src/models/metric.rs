//! Canonical metric model shared by every source.

use crate::error::MetricsError;
use crate::format;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every metric the hub knows how to display, in catalogue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Tvl,
    StablecoinsMcap,
    DexVolume24h,
    BridgedTvl,
    KtaPrice,
    KtaMarketCap,
    KtaFdv,
    ActiveWallets,
    Transactions24h,
    AvgTps,
}

/// How a metric's value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    UsdPrice,
    UsdAmount,
    Count,
    Rate,
}

impl MetricName {
    pub const ALL: [MetricName; 10] = [
        MetricName::Tvl,
        MetricName::StablecoinsMcap,
        MetricName::DexVolume24h,
        MetricName::BridgedTvl,
        MetricName::KtaPrice,
        MetricName::KtaMarketCap,
        MetricName::KtaFdv,
        MetricName::ActiveWallets,
        MetricName::Transactions24h,
        MetricName::AvgTps,
    ];

    /// Metrics with a live upstream adapter, used as the default configured set.
    pub const LIVE: [MetricName; 6] = [
        MetricName::Tvl,
        MetricName::StablecoinsMcap,
        MetricName::DexVolume24h,
        MetricName::KtaPrice,
        MetricName::KtaMarketCap,
        MetricName::KtaFdv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Tvl => "tvl",
            MetricName::StablecoinsMcap => "stablecoins_mcap",
            MetricName::DexVolume24h => "dex_volume_24h",
            MetricName::BridgedTvl => "bridged_tvl",
            MetricName::KtaPrice => "kta_price",
            MetricName::KtaMarketCap => "kta_market_cap",
            MetricName::KtaFdv => "kta_fdv",
            MetricName::ActiveWallets => "active_wallets",
            MetricName::Transactions24h => "transactions_24h",
            MetricName::AvgTps => "avg_tps",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricName::Tvl => "Total Value Locked",
            MetricName::StablecoinsMcap => "Stablecoins Market Cap",
            MetricName::DexVolume24h => "DEX Volume (24h)",
            MetricName::BridgedTvl => "Bridged TVL",
            MetricName::KtaPrice => "KTA Price",
            MetricName::KtaMarketCap => "KTA Market Cap",
            MetricName::KtaFdv => "KTA Fully Diluted Valuation",
            MetricName::ActiveWallets => "Active Wallets",
            MetricName::Transactions24h => "Transactions (24h)",
            MetricName::AvgTps => "Average TPS",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::KtaPrice => MetricKind::UsdPrice,
            MetricName::Tvl
            | MetricName::StablecoinsMcap
            | MetricName::DexVolume24h
            | MetricName::BridgedTvl
            | MetricName::KtaMarketCap
            | MetricName::KtaFdv => MetricKind::UsdAmount,
            MetricName::ActiveWallets | MetricName::Transactions24h => MetricKind::Count,
            MetricName::AvgTps => MetricKind::Rate,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MetricName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| MetricsError::Config {
                message: format!("Unknown metric name: {}", s),
            })
    }
}

/// Absolute and relative movement over the last 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Change24h {
    pub absolute: f64,
    pub percent: f64,
}

impl Change24h {
    /// Change from a previous value. A zero previous value gives a zero percentage.
    pub fn between(current: f64, previous: f64) -> Self {
        let absolute = current - previous;
        let percent = if previous != 0.0 {
            absolute / previous * 100.0
        } else {
            0.0
        };
        Self { absolute, percent }
    }

    /// Back out the absolute change from the current value and a percentage.
    pub fn from_percent(current: f64, percent: f64) -> Self {
        let factor = 1.0 + percent / 100.0;
        let absolute = if factor != 0.0 {
            current - current / factor
        } else {
            current
        };
        Self { absolute, percent }
    }
}

/// Provider-independent representation of one data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMetric {
    pub name: MetricName,
    pub current_value: f64,
    pub change_24h_absolute: f64,
    pub change_24h_percent: f64,
    pub display_string: String,
    pub last_updated: DateTime<Utc>,
    pub source_id: String,
    pub is_fallback: bool,
}

impl CanonicalMetric {
    /// Build a live metric from normalized upstream values.
    pub fn live(
        name: MetricName,
        current_value: f64,
        change: Change24h,
        source_id: impl Into<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            current_value,
            change_24h_absolute: change.absolute,
            change_24h_percent: change.percent,
            display_string: format::format_value(name.kind(), current_value),
            last_updated,
            source_id: source_id.into(),
            is_fallback: false,
        }
    }

    /// Signed 24h percentage for display, e.g. `+5.40%`.
    pub fn change_display(&self) -> String {
        format::format_percent_change(self.change_24h_percent)
    }
}
