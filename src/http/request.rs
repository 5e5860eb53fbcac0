//! Request metadata: ILP-over-HTTP header names and request IDs.
//!
//! # Responsibilities
//! - Name the headers exchanged with the peer
//! - Generate a UUID request ID for every inbound request
//! - Read the request ID back for log correlation
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An ID supplied by the peer is kept and echoed back

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Content type of packet bodies.
pub const ILP_CONTENT_TYPE: &str = "application/ilp+octet-stream";

/// Name of the sending node (tenant segment in multi-tenant mode).
pub const ILP_PEER_NAME: HeaderName = HeaderName::from_static("ilp-peer-name");

/// Destination address of the forwarded Prepare.
pub const ILP_DESTINATION: HeaderName = HeaderName::from_static("ilp-destination");

/// Request ID header.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeBridgeRequestId;

impl MakeRequestId for MakeBridgeRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID assigned to `request`, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("unknown")
        .to_string()
}
