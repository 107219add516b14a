//! Error types for the application

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure kinds reported by individual provider clients.
///
/// Providers never retry internally and never return a silent empty
/// success; every failure is one of these kinds so the fallback chain
/// can log and move on.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network-level failures (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Upstream rate limiting (HTTP 429 or provider-specific codes)
    #[error("rate limited{}", retry_after_seconds.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_seconds: Option<u64> },

    /// Response arrived but could not be parsed into the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The requested instrument/report does not exist upstream
    #[error("not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    /// Short tag for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Network(_) => "network",
            ProviderError::RateLimited { .. } => "rate-limited",
            ProviderError::Malformed(_) => "malformed",
            ProviderError::NotFound(_) => "not-found",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ProviderError::Network(err.to_string())
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            status_to_provider_error(status, err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Map an HTTP status to the matching provider error kind.
pub fn status_to_provider_error(status: reqwest::StatusCode, detail: String) -> ProviderError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_seconds: None,
        },
        reqwest::StatusCode::NOT_FOUND => ProviderError::NotFound(detail),
        _ => ProviderError::Network(format!("status {status}: {detail}")),
    }
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A single provider failed (instrument-local unless it exhausts the chain)
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Every provider in a fallback chain failed and nothing was cached
    #[error("all sources exhausted for {query}")]
    AllSourcesExhausted { query: String },

    /// The scoring collaborator did not answer within its deadline
    #[error("scoring timed out after {0:?}")]
    ScoringTimeout(Duration),

    /// The overall run deadline elapsed with tasks still outstanding
    #[error("run deadline exceeded")]
    RunDeadlineExceeded,

    /// The instrument universe could not be loaded (run-fatal)
    #[error("instrument universe unavailable: {0}")]
    UniverseUnavailable(String),

    /// A task was cancelled by a manual stop request
    #[error("run cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Snapshot artifact could not be written
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Persistence(err.to_string())
    }
}
