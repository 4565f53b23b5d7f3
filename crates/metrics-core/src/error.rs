//! Error types for the metrics core.
//!
//! Two layers are defined here:
//! - [`FetchError`] is what a single source adapter reports. It never escapes
//!   a snapshot: the aggregator turns every variant into a fallback entry.
//! - [`MetricsError`] covers configuration, history requests and everything
//!   else surfaced to callers of the crate.

use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Failure outcome of one upstream fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The upstream does not know the requested entity. Permanent until the
    /// identifier is registered with the provider, so not worth retrying.
    #[error("{source_id}: {entity} not found upstream")]
    NotFound { source_id: String, entity: String },

    /// Network failure, timeout or a non-success status other than 404.
    #[error("{source_id}: transient failure: {message}")]
    TransientFailure { source_id: String, message: String },

    /// The payload was not valid JSON or lacked an expected field.
    #[error("{source_id}: unexpected response shape: {message}")]
    SchemaMismatch { source_id: String, message: String },
}

/// Discriminant of [`FetchError`], handy for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NotFound,
    TransientFailure,
    SchemaMismatch,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::NotFound => write!(f, "not_found"),
            FetchErrorKind::TransientFailure => write!(f, "transient_failure"),
            FetchErrorKind::SchemaMismatch => write!(f, "schema_mismatch"),
        }
    }
}

impl FetchError {
    pub fn not_found(source_id: impl Into<String>, entity: impl Into<String>) -> Self {
        FetchError::NotFound {
            source_id: source_id.into(),
            entity: entity.into(),
        }
    }

    pub fn transient(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::TransientFailure {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn schema(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::SchemaMismatch {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::NotFound { .. } => FetchErrorKind::NotFound,
            FetchError::TransientFailure { .. } => FetchErrorKind::TransientFailure,
            FetchError::SchemaMismatch { .. } => FetchErrorKind::SchemaMismatch,
        }
    }

    /// Identifier of the source that produced this error.
    pub fn source_id(&self) -> &str {
        match self {
            FetchError::NotFound { source_id, .. }
            | FetchError::TransientFailure { source_id, .. }
            | FetchError::SchemaMismatch { source_id, .. } => source_id,
        }
    }

    /// Emit a warning for this error and hand it back.
    ///
    /// Used where a failure is first detected outside the HTTP client.
    pub fn logged(self) -> Self {
        warn!("{}", self);
        self
    }

    /// Check if a later call could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::TransientFailure { .. })
    }
}

/// Main error type for the metrics crate.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        MetricsError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for MetricsError {
    fn from(err: reqwest::Error) -> Self {
        MetricsError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl MetricsError {
    /// Convert to a JSON-RPC error code.
    ///
    /// - -32000: upstream/network failure
    /// - -32602: invalid params
    /// - -32603: everything else
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            MetricsError::Network { .. } | MetricsError::Fetch(_) => -32000,
            MetricsError::InvalidParams { .. } => -32602,
            _ => -32603,
        }
    }
}
