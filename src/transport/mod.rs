//! Outbound transport subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound sender
//!     → Transport::fetch(url, request)
//!     → pool.rs (HTTP/1.1 one-shot, or HTTP/2 session lookup by origin)
//!     → session.rs (long-lived multiplexed session, stream limit)
//!     → FetchResponse { status, body }
//! ```
//!
//! # Design Decisions
//! - Protocol version is fixed at construction; callers see one fetch operation
//! - At most one HTTP/2 session per origin, created lazily, closed only on teardown
//! - No retries here; a broken session stays in the table until teardown

pub mod pool;
pub mod session;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

pub use pool::TransportPool;
pub use session::Http2Session;

/// Request parameters for [`Transport::fetch`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Status and fully buffered body of a response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// A uniform fetch capability regardless of HTTP version.
pub trait Transport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        request: FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, TransportError>>;
}

/// Errors raised by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// URL cannot be used as a request target.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Session was torn down while the request was pending.
    #[error("session to {0} is closed")]
    SessionClosed(Origin),

    /// Client construction, connection, or body transfer failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Scheme, host and port identifying an upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Origin {
    pub fn from_url(url: &Url) -> Result<Self, TransportError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| TransportError::InvalidUrl(format!("{} has no host", url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TransportError::InvalidUrl(format!("{} has no port", url)))?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// URL of the origin root, used as the base for session requests.
    pub fn base_url(&self) -> Result<Url, TransportError> {
        Url::parse(&self.to_string()).map_err(|e| TransportError::InvalidUrl(e.to_string()))
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_ignores_path() {
        let a = Origin::from_url(&Url::parse("https://example.com/alice/ilp").unwrap()).unwrap();
        let b = Origin::from_url(&Url::parse("https://example.com:443/bob?x=1").unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "https://example.com:443");
    }

    #[test]
    fn test_origin_distinguishes_port_and_scheme() {
        let a = Origin::from_url(&Url::parse("http://example.com/").unwrap()).unwrap();
        let b = Origin::from_url(&Url::parse("http://example.com:8080/").unwrap()).unwrap();
        let c = Origin::from_url(&Url::parse("https://example.com/").unwrap()).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_origin_rejects_other_schemes() {
        let err = Origin::from_url(&Url::parse("ftp://example.com/").unwrap()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
