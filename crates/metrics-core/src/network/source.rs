//! Source descriptors and the adapter traits implemented per upstream.
//!
//! A [`SourceDescriptor`] is static per-provider configuration. Adapters
//! resolve it once at construction into a [`ResolvedEndpoint`], which fixes
//! the base URL and optional auth header for the life of the adapter.

use crate::config::NetworkConfig;
use crate::error::FetchError;
use crate::models::{CanonicalMetric, HistoryPoint, HistorySeries, MetricName};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Static configuration of one upstream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub public_base_url: String,
    pub authenticated_base_url: Option<String>,
    pub auth_header_name: Option<String>,
}

impl SourceDescriptor {
    /// A provider with only a public endpoint.
    pub fn public(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_base_url: base_url.into(),
            authenticated_base_url: None,
            auth_header_name: None,
        }
    }

    /// A provider with a separate keyed endpoint.
    pub fn with_auth(
        id: impl Into<String>,
        public_base_url: impl Into<String>,
        authenticated_base_url: impl Into<String>,
        auth_header_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            public_base_url: public_base_url.into(),
            authenticated_base_url: Some(authenticated_base_url.into()),
            auth_header_name: Some(auth_header_name.into()),
        }
    }

    pub fn coingecko() -> Self {
        Self::with_auth(
            "coingecko",
            NetworkConfig::COINGECKO_PUBLIC_BASE,
            NetworkConfig::COINGECKO_PRO_BASE,
            NetworkConfig::COINGECKO_API_KEY_HEADER,
        )
    }

    pub fn defillama() -> Self {
        Self::public("defillama", NetworkConfig::DEFILLAMA_BASE)
    }

    pub fn defillama_stablecoins() -> Self {
        Self::public("defillama-stablecoins", NetworkConfig::DEFILLAMA_STABLECOINS_BASE)
    }

    /// Pick the endpoint: authenticated when a key is given and the provider
    /// has a keyed endpoint, public otherwise. A missing key is not an error.
    pub fn resolve(&self, api_key: Option<&str>) -> ResolvedEndpoint {
        let key = api_key.map(str::trim).filter(|k| !k.is_empty());
        match (key, &self.authenticated_base_url, &self.auth_header_name) {
            (Some(key), Some(base_url), Some(header)) => ResolvedEndpoint {
                source_id: self.id.clone(),
                base_url: trim_base(base_url),
                auth_header: Some((header.clone(), key.to_string())),
            },
            _ => ResolvedEndpoint {
                source_id: self.id.clone(),
                base_url: trim_base(&self.public_base_url),
                auth_header: None,
            },
        }
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Base URL and credentials chosen for one adapter.
#[derive(Clone)]
pub struct ResolvedEndpoint {
    pub source_id: String,
    pub base_url: String,
    auth_header: Option<(String, String)>,
}

impl ResolvedEndpoint {
    pub fn is_authenticated(&self) -> bool {
        self.auth_header.is_some()
    }

    /// Join `path` (with or without a leading slash) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn headers(&self) -> Vec<(&str, &str)> {
        self.auth_header
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }
}

// Never print the key.
impl fmt::Debug for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedEndpoint")
            .field("source_id", &self.source_id)
            .field("base_url", &self.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// One upstream operation that yields a single canonical metric.
///
/// Implementations consult the shared cache first and only go upstream on a
/// miss. Request parameters (token or chain identifiers) are bound when the
/// adapter is built.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identifier of the provider, e.g. "coingecko".
    fn source_id(&self) -> &str;

    /// The metric this adapter produces.
    fn metric(&self) -> MetricName;

    async fn fetch(&self) -> Result<CanonicalMetric, FetchError>;
}

/// One upstream operation that yields a short historical series.
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn source_id(&self) -> &str;

    fn series(&self) -> HistorySeries;

    /// Fetch the last `days` points. Callers validate the range.
    async fn fetch_history(&self, days: u32) -> Result<Vec<HistoryPoint>, FetchError>;
}

pub type DynSourceAdapter = Arc<dyn SourceAdapter>;
pub type DynHistorySource = Arc<dyn HistorySource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_key_uses_public_endpoint() {
        let endpoint = SourceDescriptor::coingecko().resolve(None);
        assert!(!endpoint.is_authenticated());
        assert_eq!(endpoint.base_url, "https://api.coingecko.com/api/v3");
        assert!(endpoint.headers().is_empty());
    }

    #[test]
    fn test_resolve_with_key_uses_authenticated_endpoint() {
        let endpoint = SourceDescriptor::coingecko().resolve(Some("secret"));
        assert!(endpoint.is_authenticated());
        assert_eq!(endpoint.base_url, "https://pro-api.coingecko.com/api/v3");
        assert_eq!(endpoint.headers(), vec![("x-cg-pro-api-key", "secret")]);
    }

    #[test]
    fn test_blank_key_counts_as_absent() {
        let endpoint = SourceDescriptor::coingecko().resolve(Some("   "));
        assert!(!endpoint.is_authenticated());
    }

    #[test]
    fn test_public_only_provider_ignores_key() {
        let endpoint = SourceDescriptor::defillama().resolve(Some("secret"));
        assert!(!endpoint.is_authenticated());
        assert_eq!(endpoint.url("/v2/chains"), "https://api.llama.fi/v2/chains");
    }

    #[test]
    fn test_debug_redacts_key() {
        let endpoint = SourceDescriptor::coingecko().resolve(Some("secret"));
        let printed = format!("{:?}", endpoint);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("authenticated: true"));
    }
}
