//! Transport pool: per-origin HTTP/2 sessions or one-shot HTTP/1.1 requests.
//!
//! # Responsibilities
//! - Pick the protocol configured at construction
//! - Keep at most one HTTP/2 session per origin
//! - Close every session on teardown

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::Arc;
use url::Url;

use super::{FetchRequest, FetchResponse, Http2Session, Origin, Transport, TransportError};
use crate::config::{HttpVersion, OutgoingConfig};

/// Owns the outbound HTTP clients of a bridge.
#[derive(Debug)]
pub struct TransportPool {
    version: HttpVersion,
    max_requests_per_session: Option<usize>,
    /// Client for HTTP/1.1 one-shot requests.
    one_shot: reqwest::Client,
    /// Map of origin -> session.
    sessions: DashMap<Origin, Arc<Http2Session>>,
}

impl TransportPool {
    pub fn new(
        version: HttpVersion,
        max_requests_per_session: Option<usize>,
    ) -> Result<Self, TransportError> {
        let one_shot = reqwest::Client::builder().http1_only().no_proxy().build()?;
        Ok(Self {
            version,
            max_requests_per_session,
            one_shot,
            sessions: DashMap::new(),
        })
    }

    pub fn from_config(config: &OutgoingConfig) -> Result<Self, TransportError> {
        Self::new(config.http_version, config.max_requests_per_session)
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// Session for the origin of `url`, opened on first use.
    pub fn session_for(&self, url: &Url) -> Result<Arc<Http2Session>, TransportError> {
        let origin = Origin::from_url(url)?;
        let entry = self.sessions.entry(origin.clone()).or_try_insert_with(|| {
            Http2Session::open(origin, self.max_requests_per_session).map(Arc::new)
        })?;
        Ok(entry.value().clone())
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Close and forget every session. Returns how many were closed.
    pub fn close_sessions(&self) -> usize {
        let origins: Vec<Origin> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for origin in origins {
            if let Some((_, session)) = self.sessions.remove(&origin) {
                session.close();
                closed += 1;
            }
        }
        closed
    }

    async fn fetch_one_shot(
        &self,
        url: &Url,
        request: FetchRequest,
    ) -> Result<FetchResponse, TransportError> {
        let response = self
            .one_shot
            .request(request.method, url.clone())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(FetchResponse { status, body })
    }
}

impl Transport for TransportPool {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        request: FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, TransportError>> {
        async move {
            match self.version {
                HttpVersion::Http2 => {
                    let session = self.session_for(url)?;
                    session.send(url, request).await
                }
                HttpVersion::Http1 => self.fetch_one_shot(url, request).await,
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_reuses_session() {
        let pool = TransportPool::new(HttpVersion::Http2, None).unwrap();
        let a = pool.session_for(&url("http://peer.example/alice/ilp")).unwrap();
        let b = pool.session_for(&url("http://peer.example/bob/ilp?x=1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.session_count(), 1);
    }

    #[test]
    fn test_distinct_origins_get_distinct_sessions() {
        let pool = TransportPool::new(HttpVersion::Http2, Some(4)).unwrap();
        let a = pool.session_for(&url("http://peer.example/ilp")).unwrap();
        let b = pool.session_for(&url("http://peer.example:8080/ilp")).unwrap();
        let c = pool.session_for(&url("https://peer.example/ilp")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.session_count(), 3);
    }

    #[test]
    fn test_close_sessions_empties_table() {
        let pool = TransportPool::new(HttpVersion::Http2, None).unwrap();
        let a = pool.session_for(&url("http://one.example/")).unwrap();
        let b = pool.session_for(&url("http://two.example/")).unwrap();

        assert_eq!(pool.close_sessions(), 2);
        assert_eq!(pool.session_count(), 0);
        assert!(a.is_closed());
        assert!(b.is_closed());
        assert_eq!(pool.close_sessions(), 0);

        // A later lookup opens a fresh session.
        let c = pool.session_for(&url("http://one.example/")).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
