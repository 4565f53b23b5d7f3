//! Snapshot of every configured metric produced by one aggregation call.

use super::metric::{CanonicalMetric, MetricName};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub metrics: BTreeMap<MetricName, CanonicalMetric>,
}

impl MetricsSnapshot {
    pub fn new(generated_at: DateTime<Utc>, metrics: BTreeMap<MetricName, CanonicalMetric>) -> Self {
        Self {
            generated_at,
            metrics,
        }
    }

    pub fn get(&self, name: MetricName) -> Option<&CanonicalMetric> {
        self.metrics.get(&name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = MetricName> + '_ {
        self.metrics.keys().copied()
    }

    /// Number of entries served from the fallback table.
    pub fn fallback_count(&self) -> usize {
        self.metrics.values().filter(|m| m.is_fallback).count()
    }

    pub fn is_fully_live(&self) -> bool {
        self.fallback_count() == 0
    }
}
