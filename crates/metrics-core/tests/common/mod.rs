//! Local stub upstream for integration tests.
//!
//! Serves canned JSON (or an error status) per request path and counts the
//! hits on each path, so tests can tell cache hits from upstream calls.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use keeta_metrics::SourceDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StubState {
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    hits: Mutex<HashMap<String, usize>>,
    api_keys: Mutex<Vec<Option<String>>>,
}

pub struct StubUpstream {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(serve).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Serve `body` with status 200 on `path`.
    pub fn json(&self, path: &str, body: Value) {
        self.respond(path, StatusCode::OK, body.to_string());
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    /// The `x-cg-pro-api-key` header seen on each request, in order.
    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.state.api_keys.lock().unwrap().clone()
    }

    /// A token-market descriptor whose public and keyed endpoints both point here.
    pub fn coingecko(&self) -> SourceDescriptor {
        SourceDescriptor::with_auth(
            "coingecko",
            format!("{}/public", self.base_url()),
            format!("{}/pro", self.base_url()),
            "x-cg-pro-api-key",
        )
    }

    pub fn defillama(&self) -> SourceDescriptor {
        SourceDescriptor::public("defillama", self.base_url())
    }

    pub fn defillama_stablecoins(&self) -> SourceDescriptor {
        SourceDescriptor::public("defillama-stablecoins", format!("{}/stable", self.base_url()))
    }
}

async fn serve(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    state.api_keys.lock().unwrap().push(
        headers
            .get("x-cg-pro-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "{}".to_string()));

    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

pub fn coin_body(price: f64) -> Value {
    serde_json::json!({
        "id": "keeta",
        "symbol": "kta",
        "name": "Keeta",
        "last_updated": "2026-10-17T12:00:00.000Z",
        "market_data": {
            "current_price": {"usd": price},
            "market_cap": {"usd": 450000000.0},
            "fully_diluted_valuation": {"usd": 900000000.0},
            "total_volume": {"usd": 15000000.0},
            "price_change_24h": 0.023,
            "price_change_percentage_24h": 5.4,
            "market_cap_change_24h": 23000000.0,
            "market_cap_change_percentage_24h": 5.4
        }
    })
}

pub fn chains_body() -> Value {
    serde_json::json!([
        {"name": "Ethereum", "tvl": 60000000000.0, "tvlPrevDay": 59000000000.0},
        {"name": "Keeta", "tvl": 3300000.0, "tvlPrevDay": 3000000.0}
    ])
}

pub fn stablecoins_body() -> Value {
    serde_json::json!([
        {"name": "Keeta", "totalCirculatingUSD": {"peggedUSD": 1200000.0}}
    ])
}

pub fn dex_body() -> Value {
    serde_json::json!({"dailyVolume": 2400000.0, "totalVolume24hPrev": 2000000.0})
}

/// Collects formatted `tracing` output so tests can assert on log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's warnings and errors into a fresh buffer until the
    /// guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
