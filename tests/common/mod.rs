//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use chrono::{Duration, Utc};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ilp_http_bridge::packet::{Fulfill, Prepare};
use ilp_http_bridge::{BridgeConfig, HandlerError, HttpBridge};

pub const INCOMING_TOKEN: &str = "incoming-token";

/// Config for a bridge on an ephemeral port that sends to `outgoing_url`.
pub fn bridge_config(name: &str, outgoing_url: &str) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.listener.port = 0;
    config.listener.name = Some(name.to_string());
    config.incoming.token = Some(INCOMING_TOKEN.to_string());
    config.outgoing.token = Some(INCOMING_TOKEN.to_string());
    config.outgoing.url = outgoing_url.to_string();
    config
}

/// Connect `bridge` and return a loopback address for its listener.
pub async fn connect(bridge: &HttpBridge) -> SocketAddr {
    bridge.connect().await.unwrap();
    let addr = bridge.local_addr().await.unwrap();
    SocketAddr::from(([127, 0, 0, 1], addr.port()))
}

/// HTTP client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn prepare(destination: &str) -> Prepare {
    Prepare {
        amount: 100,
        expires_at: Utc::now() + Duration::seconds(30),
        execution_condition: [7u8; 32],
        destination: destination.to_string(),
        data: Bytes::from_static(b"ping"),
    }
}

pub fn fulfill() -> Fulfill {
    Fulfill {
        fulfillment: [9u8; 32],
        data: Bytes::from_static(b"pong"),
    }
}

/// Register a handler answering every packet with [`fulfill`].
pub fn fulfill_all(bridge: &HttpBridge) {
    bridge.register_data_handler(|_data: Bytes| async move {
        Ok::<_, HandlerError>(fulfill().to_bytes())
    });
}

/// A request seen by a [`start_recording_peer`] backend.
#[derive(Debug)]
pub struct Recorded {
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start a peer that records each request and answers with a fixed status and body.
pub async fn start_recording_peer(
    status: StatusCode,
    response: Bytes,
) -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
        let tx = tx.clone();
        let response = response.clone();
        async move {
            let _ = tx.send(Recorded { uri, headers, body });
            (status, response)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}
