//! DefiLlama response schemas.

use crate::error::FetchError;
use crate::models::{Change24h, HistoryPoint};
use chrono::DateTime;
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of `GET /v2/chains`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTvlEntry {
    pub name: String,
    pub tvl: f64,
    #[serde(default)]
    pub tvl_prev_day: Option<f64>,
}

impl ChainTvlEntry {
    /// Change against the previous day; no previous value means no change.
    pub fn change_24h(&self) -> Change24h {
        match self.tvl_prev_day {
            Some(previous) => Change24h::between(self.tvl, previous),
            None => Change24h::default(),
        }
    }
}

/// One entry of `GET /stablecoinchains`.
///
/// The circulating total is either a plain number or a per-peg map
/// (`{"peggedUSD": ...}`); both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StablecoinChainEntry {
    pub name: String,
    #[serde(default)]
    pub total_circulating: Option<PeggedAmount>,
    #[serde(default, rename = "totalCirculatingUSD")]
    pub total_circulating_usd: Option<PeggedAmount>,
    #[serde(default)]
    pub total_circulating_prev_day: Option<PeggedAmount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeggedAmount {
    Total(f64),
    ByPeg(HashMap<String, f64>),
}

impl PeggedAmount {
    pub fn total(&self) -> f64 {
        match self {
            PeggedAmount::Total(value) => *value,
            PeggedAmount::ByPeg(pegs) => pegs.values().sum(),
        }
    }
}

impl StablecoinChainEntry {
    pub fn circulating(&self, source_id: &str) -> Result<f64, FetchError> {
        self.total_circulating
            .as_ref()
            .or(self.total_circulating_usd.as_ref())
            .map(PeggedAmount::total)
            .ok_or_else(|| {
                FetchError::schema(source_id, format!("{}: no circulating total", self.name))
                    .logged()
            })
    }

    pub fn change_24h(&self, current: f64) -> Change24h {
        match &self.total_circulating_prev_day {
            Some(previous) => Change24h::between(current, previous.total()),
            None => Change24h::default(),
        }
    }
}

/// `GET /overview/dexs/{chain}` summary fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexOverview {
    #[serde(default)]
    pub daily_volume: Option<f64>,
    #[serde(default)]
    pub total24h: Option<f64>,
    #[serde(default)]
    pub total48hto24h: Option<f64>,
    #[serde(default, rename = "totalVolume24hPrev")]
    pub total_volume_24h_prev: Option<f64>,
    #[serde(default, rename = "change_1d")]
    pub change_1d: Option<f64>,
}

impl DexOverview {
    /// Last 24h volume and its change.
    ///
    /// The volume is `dailyVolume`, else `total24h`. The change is taken from
    /// the previous 24h window when present, else from `change_1d`.
    pub fn volume_24h(&self, source_id: &str) -> Result<(f64, Change24h), FetchError> {
        let current = self
            .daily_volume
            .or(self.total24h)
            .ok_or_else(|| {
                FetchError::schema(source_id, "dex overview: no 24h volume").logged()
            })?;

        let change = match self.total_volume_24h_prev.or(self.total48hto24h) {
            Some(previous) => Change24h::between(current, previous),
            None => match self.change_1d {
                Some(percent) => Change24h::from_percent(current, percent),
                None => Change24h::default(),
            },
        };
        Ok((current, change))
    }
}

/// One point of `GET /v2/historicalChainTvl/{chain}`; `date` is unix seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalTvlPoint {
    pub date: i64,
    pub tvl: f64,
}

impl HistoricalTvlPoint {
    pub fn into_point(self, source_id: &str) -> Result<HistoryPoint, FetchError> {
        DateTime::from_timestamp(self.date, 0)
            .map(|timestamp| HistoryPoint {
                timestamp,
                value: self.tvl,
            })
            .ok_or_else(|| {
                FetchError::schema(source_id, format!("invalid date {}", self.date)).logged()
            })
    }
}

/// First entry whose name contains `needle`, ignoring case.
pub fn find_chain<'a, T, F>(entries: &'a [T], needle: &str, name: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = needle.to_lowercase();
    entries
        .iter()
        .find(|entry| name(entry).to_lowercase().contains(&needle))
}
