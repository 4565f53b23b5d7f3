//! JSON-RPC request handlers.

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use keeta_metrics::{HistoryConfig, HistorySeries, MetricsError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i32 = -32601;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

/// Outcome of dispatching one method.
enum Dispatch {
    Done(keeta_metrics::Result<Value>),
    UnknownMethod,
}

/// Extract an optional `days` parameter, defaulting to the standard window.
///
/// Range checks happen in the aggregator; this only rejects values that are
/// not a non-negative integer.
fn days_param(params: &Value) -> keeta_metrics::Result<u32> {
    match params.get("days") {
        None | Some(Value::Null) => Ok(HistoryConfig::DEFAULT_DAYS),
        Some(value) => value
            .as_u64()
            .and_then(|days| u32::try_from(days).ok())
            .ok_or_else(|| MetricsError::InvalidParams {
                message: format!("days must be a non-negative integer, got {}", value),
            }),
    }
}

async fn dispatch_method(state: &AppState, method: &str, params: &Value) -> Dispatch {
    let result = match method {
        "get_metrics_snapshot" => {
            let snapshot = state.aggregator.build_snapshot().await;
            serde_json::to_value(&snapshot).map_err(MetricsError::from)
        }

        "get_price_history" => match days_param(params) {
            Ok(days) => state
                .aggregator
                .history(HistorySeries::TokenPrice, days)
                .await
                .and_then(|points| serde_json::to_value(points).map_err(MetricsError::from)),
            Err(e) => Err(e),
        },

        "get_tvl_history" => match days_param(params) {
            Ok(days) => state
                .aggregator
                .history(HistorySeries::ChainTvl, days)
                .await
                .and_then(|points| serde_json::to_value(points).map_err(MetricsError::from)),
            Err(e) => Err(e),
        },

        "get_cache_stats" => {
            serde_json::to_value(state.aggregator.cache_stats()).map_err(MetricsError::from)
        }

        _ => return Dispatch::UnknownMethod,
    };
    Dispatch::Done(result)
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    match dispatch_method(&state, method, &params).await {
        Dispatch::Done(Ok(value)) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Dispatch::Done(Err(e)) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
        Dispatch::UnknownMethod => {
            warn!("Method not found: {}", method);
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                )),
            )
        }
    }
}
