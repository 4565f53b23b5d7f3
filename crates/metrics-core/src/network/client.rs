//! HTTP client used by every upstream source.
//!
//! Wraps reqwest with:
//! - A fixed user agent and a default timeout on every request
//! - Status classification into the [`FetchError`] taxonomy
//! - JSON decoding where any shape problem becomes `SchemaMismatch`

use crate::config::NetworkConfig;
use crate::error::{FetchError, MetricsError, Result};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client shared by the source adapters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| MetricsError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// GET `url` and decode the body as `T`.
    ///
    /// - 404 → `NotFound` for `entity`
    /// - any other non-2xx, network error or timeout → `TransientFailure`
    /// - undecodable body → `SchemaMismatch`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source_id: &str,
        entity: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        debug!("GET {} ({})", url, source_id);
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(source_id, url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("{}: {} not found at {}", source_id, entity, extract_domain(url));
            return Err(FetchError::not_found(source_id, entity));
        }
        if !status.is_success() {
            warn!("{}: HTTP {} for {}", source_id, status, entity);
            return Err(FetchError::transient(
                source_id,
                format!("HTTP {} from {}", status, extract_domain(url)),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(source_id, url, e))?;

        serde_json::from_slice::<T>(&body).map_err(|e| {
            warn!("{}: unexpected payload for {}: {}", source_id, entity, e);
            FetchError::schema(source_id, format!("{}: {}", entity, e))
        })
    }

    fn transport_error(&self, source_id: &str, url: &str, err: reqwest::Error) -> FetchError {
        let message = if err.is_timeout() {
            format!(
                "request to {} timed out after {:?}",
                extract_domain(url),
                self.default_timeout
            )
        } else {
            format!("request to {} failed: {}", extract_domain(url), err)
        };
        warn!("{}: {}", source_id, message);
        FetchError::transient(source_id, message)
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
