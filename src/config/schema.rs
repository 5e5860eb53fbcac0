//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::packet::IldcpResponse;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (port, node name).
    pub listener: ListenerConfig,

    /// Serve many tenants behind one listener.
    pub multi_tenant: bool,

    /// Placeholder in `outgoing.url` replaced by the tenant segment.
    pub multi_delimiter: char,

    /// Pre-known discovery response; skips the `peer.config` round-trip.
    pub ildcp: Option<IldcpResponse>,

    /// Credentials accepted from the peer.
    pub incoming: IncomingConfig,

    /// Peer endpoint and the credentials presented to it.
    pub outgoing: OutgoingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            multi_tenant: false,
            multi_delimiter: '%',
            ildcp: None,
            incoming: IncomingConfig::default(),
            outgoing: OutgoingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Name sent in `ILP-Peer-Name`; falls back to the port number.
    pub fn node_name(&self) -> String {
        self.listener
            .name
            .clone()
            .unwrap_or_else(|| self.listener.port.to_string())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port to listen on (0 picks an ephemeral port).
    pub port: u16,

    /// Local node name.
    pub name: Option<String>,
}

/// Inbound credentials.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IncomingConfig {
    /// Shared secret verifying HS256 bearer tokens.
    pub secret: Option<String>,

    /// Static bearer token.
    pub token: Option<String>,
}

/// HTTP protocol used for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersion {
    /// One-shot HTTP/1.1 requests.
    #[default]
    Http1,
    /// Long-lived multiplexed session per origin.
    Http2,
}

/// Outbound endpoint and credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutgoingConfig {
    /// Peer URL; may contain the multi-tenant delimiter.
    pub url: String,

    /// Transport protocol.
    pub http_version: HttpVersion,

    /// Concurrent request ceiling per HTTP/2 session.
    pub max_requests_per_session: Option<usize>,

    /// Forward the Prepare destination in `ILP-Destination`.
    pub send_ilp_destination: bool,

    /// Shared secret signing HS256 bearer tokens.
    pub secret: Option<String>,

    /// Static bearer token (takes precedence over `secret`).
    pub token: Option<String>,

    /// Lifetime of signed tokens in seconds.
    pub expiry_secs: u64,
}

impl Default for OutgoingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            http_version: HttpVersion::Http1,
            max_requests_per_session: None,
            send_ilp_destination: false,
            secret: None,
            token: None,
            expiry_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
