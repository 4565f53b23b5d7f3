//! End-to-end snapshot assembly against a local stub upstream.

mod common;

use axum::http::StatusCode;
use common::{chains_body, coin_body, dex_body, stablecoins_body, StubUpstream};
use keeta_metrics::{
    FallbackProvider, HistorySeries, MetricName, MetricsAggregator, MetricsConfig, MetricsError,
    SourceDescriptors,
};
use serde_json::json;
use std::time::Duration;

fn descriptors(stub: &StubUpstream) -> SourceDescriptors {
    SourceDescriptors {
        coingecko: stub.coingecko(),
        defillama: stub.defillama(),
        defillama_stablecoins: stub.defillama_stablecoins(),
    }
}

fn config() -> MetricsConfig {
    MetricsConfig {
        request_timeout: Duration::from_secs(5),
        ..MetricsConfig::default()
    }
}

fn serve_everything(stub: &StubUpstream) {
    stub.json("/public/coins/keeta", coin_body(0.45));
    stub.json("/v2/chains", chains_body());
    stub.json("/stable/stablecoinchains", stablecoins_body());
    stub.json("/overview/dexs/keeta", dex_body());
}

#[tokio::test]
async fn test_healthy_upstreams_give_fully_live_snapshot() {
    let stub = StubUpstream::start().await;
    serve_everything(&stub);

    let aggregator = MetricsAggregator::with_descriptors(&config(), &descriptors(&stub)).unwrap();
    let snapshot = aggregator.build_snapshot().await;

    assert_eq!(snapshot.names().collect::<Vec<_>>(), MetricName::LIVE.to_vec());
    assert!(snapshot.is_fully_live());
    assert_eq!(snapshot.get(MetricName::KtaFdv).unwrap().display_string, "$900.0M");

    // Second snapshot inside the TTL is served entirely from cache.
    let hits = stub.total_hits();
    let again = aggregator.build_snapshot().await;
    assert_eq!(stub.total_hits(), hits);
    assert_eq!(again.metrics, snapshot.metrics);
    assert_eq!(aggregator.cache_stats().metrics.hits, 6);
}

#[tokio::test]
async fn test_missing_chain_falls_back_for_that_metric_only() {
    let stub = StubUpstream::start().await;
    serve_everything(&stub);
    stub.json("/v2/chains", json!([{"name": "Ethereum", "tvl": 1.0}]));

    let aggregator = MetricsAggregator::with_descriptors(&config(), &descriptors(&stub)).unwrap();
    let snapshot = aggregator.build_snapshot().await;

    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot.fallback_count(), 1);
    let tvl = snapshot.get(MetricName::Tvl).unwrap();
    assert_eq!(
        tvl,
        &FallbackProvider::new().placeholder_at(MetricName::Tvl, snapshot.generated_at)
    );
    assert!(!snapshot.get(MetricName::KtaPrice).unwrap().is_fallback);
}

#[tokio::test]
async fn test_server_error_falls_back_for_that_metric_only() {
    let stub = StubUpstream::start().await;
    serve_everything(&stub);
    stub.respond("/overview/dexs/keeta", StatusCode::INTERNAL_SERVER_ERROR, "oops");

    let aggregator = MetricsAggregator::with_descriptors(&config(), &descriptors(&stub)).unwrap();
    let snapshot = aggregator.build_snapshot().await;

    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot.fallback_count(), 1);
    assert!(snapshot.get(MetricName::DexVolume24h).unwrap().is_fallback);
    assert_eq!(snapshot.get(MetricName::Tvl).unwrap().current_value, 3_300_000.0);
}

#[tokio::test]
async fn test_total_outage_degrades_every_metric() {
    let stub = StubUpstream::start().await;
    for path in [
        "/public/coins/keeta",
        "/v2/chains",
        "/stable/stablecoinchains",
        "/overview/dexs/keeta",
    ] {
        stub.respond(path, StatusCode::SERVICE_UNAVAILABLE, "down");
    }

    let aggregator = MetricsAggregator::with_descriptors(&config(), &descriptors(&stub)).unwrap();
    let snapshot = aggregator.build_snapshot().await;

    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot.fallback_count(), 6);
    for metric in snapshot.metrics.values() {
        assert_eq!(metric.source_id, "fallback");
    }
}

#[tokio::test]
async fn test_configured_catalogue_metrics_without_source() {
    let stub = StubUpstream::start().await;
    serve_everything(&stub);

    let config = MetricsConfig {
        metrics: vec![MetricName::KtaPrice, MetricName::BridgedTvl, MetricName::ActiveWallets],
        ..config()
    };
    let aggregator = MetricsAggregator::with_descriptors(&config, &descriptors(&stub)).unwrap();
    let snapshot = aggregator.build_snapshot().await;

    assert_eq!(snapshot.len(), 3);
    assert!(!snapshot.get(MetricName::KtaPrice).unwrap().is_fallback);
    assert!(snapshot.get(MetricName::BridgedTvl).unwrap().is_fallback);
    assert!(snapshot.get(MetricName::ActiveWallets).unwrap().is_fallback);
    // Only the configured token metric went upstream.
    assert_eq!(stub.total_hits(), 1);
}

#[tokio::test]
async fn test_history_errors_surface() {
    let stub = StubUpstream::start().await;
    stub.respond("/v2/historicalChainTvl/Keeta", StatusCode::BAD_GATEWAY, "bad gateway");

    let aggregator = MetricsAggregator::with_descriptors(&config(), &descriptors(&stub)).unwrap();
    let err = aggregator.history(HistorySeries::ChainTvl, 7).await.unwrap_err();
    assert!(matches!(err, MetricsError::Fetch(_)));
    assert_eq!(err.to_rpc_error_code(), -32000);
}
