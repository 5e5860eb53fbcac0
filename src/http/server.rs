//! HTTP server setup and the inbound packet handler.
//!
//! # Responsibilities
//! - Create the Axum router with tracing and request-ID middleware
//! - Serve HTTP/1.1 and HTTP/2 on the configured port
//! - Apply the inbound decision chain to every request
//! - Stop gracefully when the bridge disconnects

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::bridge::sender::is_valid_segment;
use crate::bridge::BridgeContext;
use crate::error::BridgeError;
use crate::http::request::{request_id, MakeBridgeRequestId, ILP_CONTENT_TYPE, ILP_PEER_NAME};
use crate::lifecycle::Shutdown;
use crate::packet::{Prepare, ILDCP_DESTINATION, MAX_PACKET_SIZE};

/// How long in-flight requests may drain before the server task is aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Build the Axum router with all middleware layers.
pub fn build_router(ctx: Arc<BridgeContext>) -> Router {
    Router::new()
        .route("/", any(ilp_handler))
        .route("/{*path}", any(ilp_handler))
        .with_state(ctx)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeBridgeRequestId))
}

/// Listener task owned by a connected bridge.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Bind `port` on all interfaces and start serving.
    pub async fn start(ctx: Arc<BridgeContext>, port: u16) -> std::io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
        let local_addr = listener.local_addr()?;

        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let app = build_router(ctx);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal.fired())
                .await
        });

        tracing::info!(address = %local_addr, "HTTP listener started");
        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, drain in-flight requests, then abort after [`SHUTDOWN_GRACE`].
    pub async fn stop(mut self) {
        self.shutdown.trigger();
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "HTTP listener exited with error"),
            Ok(Err(e)) => tracing::warn!(error = %e, "HTTP listener task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "In-flight requests did not drain, aborting listener"
                );
                self.task.abort();
            }
        }
        tracing::info!(address = %self.local_addr, "HTTP listener stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Entry point for every inbound request.
async fn ilp_handler(State(ctx): State<Arc<BridgeContext>>, request: Request<Body>) -> Response {
    // Health checks skip authentication and the connectivity check.
    if request.method() == Method::GET || request.method() == Method::HEAD {
        return (StatusCode::OK, "OK").into_response();
    }

    let request_id = request_id(&request);
    match handle_packet(&ctx, request).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, ILP_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::warn!(request_id = %request_id, status = %status, error = %e, "Inbound request failed");
            } else {
                tracing::debug!(request_id = %request_id, status = %status, error = %e, "Inbound request refused");
            }
            (status, e.to_string()).into_response()
        }
    }
}

async fn handle_packet(ctx: &BridgeContext, request: Request<Body>) -> Result<Bytes, BridgeError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !ctx.auth.verify_incoming(authorization) {
        return Err(BridgeError::Unauthorized);
    }

    if !ctx.is_connected() {
        return Err(BridgeError::NotConnected);
    }

    let (parts, body) = request.into_parts();
    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_PACKET_SIZE) {
        return Err(BridgeError::PayloadTooLarge);
    }
    // The limit is the only body-level rejection, so any read failure is
    // reported as oversize.
    let data = axum::body::to_bytes(body, MAX_PACKET_SIZE)
        .await
        .map_err(|_| BridgeError::PayloadTooLarge)?;

    if ctx.config.multi_tenant {
        let prepare = Prepare::from_bytes(&data)?;
        if prepare.destination == ILDCP_DESTINATION {
            let peer_name = parts
                .headers
                .get(ILP_PEER_NAME)
                .and_then(|v| v.to_str().ok())
                .ok_or(BridgeError::MissingPeerName)?;
            if !is_valid_segment(peer_name) {
                return Err(BridgeError::InvalidAddressSegment(peer_name.to_string()));
            }

            let base = ctx.discovery.fetch(&ctx.handlers).await?;
            let tenant =
                base.with_client_address(format!("{}.{}", base.client_address, peer_name));
            tracing::debug!(client_address = %tenant.client_address, "Answered ILDCP request for tenant");
            return Ok(tenant.to_bytes());
        }
    }

    let handler = ctx
        .handlers
        .current()
        .ok_or(BridgeError::NoHandlerRegistered)?;
    tracing::trace!(bytes = data.len(), "Dispatching packet to handler");
    Ok(handler.handle_data(data).await?)
}
