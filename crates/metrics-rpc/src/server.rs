//! HTTP server implementation using Axum.

use crate::handler::{handle_health, handle_rpc};
use axum::{
    routing::{get, post},
    Router,
};
use keeta_metrics::MetricsAggregator;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Snapshot and history assembly, including the shared cache
    pub aggregator: Arc<MetricsAggregator>,
}

/// Build the router for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    aggregator: Arc<MetricsAggregator>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let app = router(Arc::new(AppState { aggregator }));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeta_metrics::{MetricName, MetricsCache};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn offline_aggregator() -> Arc<MetricsAggregator> {
        let cache = Arc::new(MetricsCache::new(Duration::from_secs(60)));
        Arc::new(
            MetricsAggregator::builder(cache)
                .metrics([MetricName::BridgedTvl, MetricName::AvgTps])
                .build(),
        )
    }

    async fn call(addr: SocketAddr, method: &str, params: Value) -> Value {
        reqwest::Client::new()
            .post(format!("http://{}/rpc", addr))
            .json(&json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_server_starts() {
        let addr = start_server(offline_aggregator(), "127.0.0.1", 0).await.unwrap();
        assert!(addr.port() > 0);

        let health: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_snapshot_over_rpc() {
        let addr = start_server(offline_aggregator(), "127.0.0.1", 0).await.unwrap();

        let response = call(addr, "get_metrics_snapshot", json!({})).await;
        let result = &response["result"];
        assert_eq!(result["success"], true);
        let metrics = result["snapshot"]["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["bridged_tvl"]["isFallback"], true);
        assert_eq!(metrics["avg_tps"]["displayString"], "32.9");
    }

    #[tokio::test]
    async fn test_rpc_errors() {
        let addr = start_server(offline_aggregator(), "127.0.0.1", 0).await.unwrap();

        let response = call(addr, "get_price_history", json!({"days": 0})).await;
        assert_eq!(response["error"]["code"], -32602);

        // No history sources registered.
        let response = call(addr, "get_tvl_history", json!({"days": 7})).await;
        assert_eq!(response["error"]["code"], -32602);

        let response = call(addr, "no_such_method", json!({})).await;
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["id"], 1);
    }
}
