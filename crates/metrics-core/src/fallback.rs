//! Documented placeholder values served when a live source fails.
//!
//! Placeholders are constants. They are never built from stale cache
//! entries, so a fallback value is the same no matter what failed.

use crate::models::{CanonicalMetric, Change24h, MetricName};
use crate::format;
use chrono::{DateTime, Utc};

/// `source_id` carried by every placeholder.
pub const FALLBACK_SOURCE_ID: &str = "fallback";

/// Fixed value and 24h percentage for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackValue {
    pub value: f64,
    pub change_24h_percent: f64,
}

const fn entry(value: f64, change_24h_percent: f64) -> FallbackValue {
    FallbackValue {
        value,
        change_24h_percent,
    }
}

/// Supplies placeholder metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackProvider;

impl FallbackProvider {
    pub fn new() -> Self {
        Self
    }

    /// The constant behind `name`'s placeholder.
    pub fn value_for(name: MetricName) -> FallbackValue {
        match name {
            MetricName::Tvl => entry(2_100_000.0, 5.2),
            MetricName::StablecoinsMcap => entry(850_000.0, 2.1),
            MetricName::DexVolume24h => entry(1_200_000.0, 12.5),
            MetricName::BridgedTvl => entry(450_000.0, -1.8),
            MetricName::KtaPrice => entry(0.045, 8.3),
            MetricName::KtaMarketCap => entry(45_000_000.0, 8.1),
            MetricName::KtaFdv => entry(90_000_000.0, 8.3),
            MetricName::ActiveWallets => entry(25_847.0, 15.2),
            MetricName::Transactions24h => entry(2_847_293.0, 23.1),
            MetricName::AvgTps => entry(32.9, 23.1),
        }
    }

    /// Placeholder for `name`, stamped now.
    pub fn placeholder(&self, name: MetricName) -> CanonicalMetric {
        self.placeholder_at(name, Utc::now())
    }

    /// Placeholder for `name`, stamped with `at`.
    pub fn placeholder_at(&self, name: MetricName, at: DateTime<Utc>) -> CanonicalMetric {
        let fixed = Self::value_for(name);
        let change = Change24h::from_percent(fixed.value, fixed.change_24h_percent);
        CanonicalMetric {
            name,
            current_value: fixed.value,
            change_24h_absolute: change.absolute,
            change_24h_percent: change.percent,
            display_string: format::format_value(name.kind(), fixed.value),
            last_updated: at,
            source_id: FALLBACK_SOURCE_ID.to_string(),
            is_fallback: true,
        }
    }
}
