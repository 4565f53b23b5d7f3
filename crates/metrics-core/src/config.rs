//! Centralized configuration for the metrics core.
//!
//! Constant tables hold the fixed defaults; [`MetricsConfig`] carries the
//! values that may be overridden from the environment at process start.

use crate::error::{MetricsError, Result};
use crate::models::MetricName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &'static str = "Keeta-Metrics/0.1";

    pub const COINGECKO_PUBLIC_BASE: &'static str = "https://api.coingecko.com/api/v3";
    pub const COINGECKO_PRO_BASE: &'static str = "https://pro-api.coingecko.com/api/v3";
    pub const COINGECKO_API_KEY_HEADER: &'static str = "x-cg-pro-api-key";
    pub const DEFILLAMA_BASE: &'static str = "https://api.llama.fi";
    pub const DEFILLAMA_STABLECOINS_BASE: &'static str = "https://stablecoins.llama.fi";
}

/// Cache configuration.
pub struct CacheSettings;

impl CacheSettings {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
}

/// History request bounds.
pub struct HistoryConfig;

impl HistoryConfig {
    pub const DEFAULT_DAYS: u32 = 30;
    pub const MAX_DAYS: u32 = 365;
}

/// Environment variables read by [`MetricsConfig::from_env`].
pub struct EnvVars;

impl EnvVars {
    pub const COINGECKO_API_KEY: &'static str = "COINGECKO_API_KEY";
    pub const TOKEN_ID: &'static str = "KEETA_METRICS_TOKEN_ID";
    pub const CHAIN_NAME: &'static str = "KEETA_METRICS_CHAIN_NAME";
    pub const DEX_CHAIN: &'static str = "KEETA_METRICS_DEX_CHAIN";
    pub const TTL_SECS: &'static str = "KEETA_METRICS_TTL_SECS";
    pub const TIMEOUT_SECS: &'static str = "KEETA_METRICS_TIMEOUT_SECS";
    pub const METRICS: &'static str = "KEETA_METRICS_METRICS";
}

/// Runtime configuration for one aggregator instance.
///
/// The upstream identifiers are provisional until the token and chain are
/// listed with the providers, so they are configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsConfig {
    /// Token identifier on the token-market provider.
    pub token_id: String,
    /// Chain name matched (case-insensitive substring) in chain listings.
    pub chain_name: String,
    /// Chain slug used by the DEX volume and TVL history endpoints.
    pub dex_chain: String,
    /// Cache time-to-live for every entry.
    pub ttl: Duration,
    /// Upper bound on each upstream call.
    pub request_timeout: Duration,
    /// Metric names every snapshot must contain.
    pub metrics: Vec<MetricName>,
    /// Optional token-market API key; switches to the authenticated endpoint.
    #[serde(skip_serializing, default)]
    pub coingecko_api_key: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            token_id: "keeta".to_string(),
            chain_name: "Keeta".to_string(),
            dex_chain: "keeta".to_string(),
            ttl: CacheSettings::DEFAULT_TTL,
            request_timeout: NetworkConfig::REQUEST_TIMEOUT,
            metrics: MetricName::LIVE.to_vec(),
            coingecko_api_key: None,
        }
    }
}

impl MetricsConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        config.coingecko_api_key = get(EnvVars::COINGECKO_API_KEY);
        if let Some(token_id) = get(EnvVars::TOKEN_ID) {
            config.token_id = token_id;
        }
        if let Some(chain_name) = get(EnvVars::CHAIN_NAME) {
            config.chain_name = chain_name;
        }
        if let Some(dex_chain) = get(EnvVars::DEX_CHAIN) {
            config.dex_chain = dex_chain;
        }
        if let Some(raw) = get(EnvVars::TTL_SECS) {
            config.ttl = Duration::from_secs(parse_secs(EnvVars::TTL_SECS, &raw)?);
        }
        if let Some(raw) = get(EnvVars::TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_secs(EnvVars::TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = get(EnvVars::METRICS) {
            config.metrics = raw
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<MetricName>>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every fetch fail or loop.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("token_id", &self.token_id),
            ("chain_name", &self.chain_name),
            ("dex_chain", &self.dex_chain),
        ] {
            if value.trim().is_empty() {
                return Err(MetricsError::Config {
                    message: format!("{} must not be empty", field),
                });
            }
        }
        if self.request_timeout.is_zero() {
            return Err(MetricsError::Config {
                message: "request_timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn has_coingecko_key(&self) -> bool {
        self.coingecko_api_key.is_some()
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|e| MetricsError::Config {
        message: format!("{}={:?} is not a number of seconds: {}", var, raw, e),
    })
}
