//! Long-lived HTTP/2 session to a single origin.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;
use uuid::Uuid;

use super::{FetchRequest, FetchResponse, Origin, TransportError};

/// Multiplexed session bound to one origin.
///
/// The underlying client speaks HTTP/2 with prior knowledge and keeps its
/// connection open between requests. An optional semaphore caps the number
/// of concurrent streams.
#[derive(Debug)]
pub struct Http2Session {
    id: Uuid,
    origin: Origin,
    client: reqwest::Client,
    stream_limit: Option<Arc<Semaphore>>,
    closed: AtomicBool,
}

impl Http2Session {
    pub fn open(origin: Origin, max_requests: Option<usize>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .http2_prior_knowledge()
            .no_proxy()
            .build()?;
        let id = Uuid::new_v4();

        tracing::debug!(
            session_id = %id,
            origin = %origin,
            max_requests = ?max_requests,
            "Opened HTTP/2 session"
        );

        Ok(Self {
            id,
            origin,
            client,
            stream_limit: max_requests.map(|n| Arc::new(Semaphore::new(n))),
            closed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Target on this session's origin carrying the path and query of `url`.
    pub fn target_url(&self, url: &Url) -> Result<Url, TransportError> {
        let mut target = self.origin.base_url()?;
        target.set_path(url.path());
        target.set_query(url.query());
        Ok(target)
    }

    /// Issue a request for the path and query of `url` on this session's origin.
    pub async fn send(
        &self,
        url: &Url,
        request: FetchRequest,
    ) -> Result<FetchResponse, TransportError> {
        if self.is_closed() {
            return Err(TransportError::SessionClosed(self.origin.clone()));
        }

        let _permit = match &self.stream_limit {
            Some(limit) => Some(
                limit
                    .acquire()
                    .await
                    .map_err(|_| TransportError::SessionClosed(self.origin.clone()))?,
            ),
            None => None,
        };

        let target = self.target_url(url)?;
        let response = self
            .client
            .request(request.method, target)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::trace!(session_id = %self.id, status = %status, "Session request complete");
        Ok(FetchResponse { status, body })
    }

    /// Stop accepting requests; waiters on the stream limit are released with an error.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(limit) = &self.stream_limit {
            limit.close();
        }
        tracing::debug!(session_id = %self.id, origin = %self.origin, "Closed HTTP/2 session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn origin() -> Origin {
        Origin {
            scheme: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
        }
    }

    #[tokio::test]
    async fn test_closed_session_refuses_requests() {
        let session = Http2Session::open(origin(), Some(2)).unwrap();
        session.close();
        assert!(session.is_closed());

        let request = FetchRequest {
            method: Method::POST,
            headers: Default::default(),
            body: bytes::Bytes::new(),
        };
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let err = session.send(&url, request).await.unwrap_err();
        assert!(matches!(err, TransportError::SessionClosed(_)));
    }

    #[test]
    fn test_target_keeps_origin_for_double_slash_paths() {
        let session = Http2Session::open(origin(), None).unwrap();
        let url = Url::parse("http://127.0.0.1:1//x/ilp?tenant=a").unwrap();
        let target = session.target_url(&url).unwrap();
        assert_eq!(target.host_str(), Some("127.0.0.1"));
        assert_eq!(target.port(), Some(1));
        assert_eq!(target.path(), "//x/ilp");
        assert_eq!(target.query(), Some("tenant=a"));
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = Http2Session::open(origin(), None).unwrap();
        let b = Http2Session::open(origin(), None).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
