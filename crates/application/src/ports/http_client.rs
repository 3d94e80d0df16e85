//! HTTP Client port

use async_trait::async_trait;
use lmsforce_domain::{HttpRequest, HttpResponse};

/// Errors raised before a response could be read.
///
/// A non-2xx response is not an error at this level; callers decide what a
/// given status means.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpClientError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying error message.
        message: String,
    },

    /// The remote end refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection-level failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Anything else, including failures reading the response body.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Short machine-readable error code for logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::DnsError { .. } => "dns",
            Self::ConnectionRefused { .. } => "connection_refused",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Other(_) => "other",
        }
    }
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails due to network issues,
    /// timeout, or an unusable URL.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError>;
}
