//! Bridge error taxonomy and its HTTP status mapping.

use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;
use crate::bridge::handler::HandlerError;
use crate::packet::PacketError;
use crate::transport::TransportError;

/// Errors surfaced by inbound request handling and outbound sends.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Inbound bearer token rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Operation attempted while disconnected.
    #[error("server is closed")]
    NotConnected,

    /// Inbound packet arrived with no data handler registered.
    #[error("no handler registered")]
    NoHandlerRegistered,

    /// Request body exceeds the packet size ceiling.
    #[error("packet exceeds {} bytes", crate::packet::MAX_PACKET_SIZE)]
    PayloadTooLarge,

    /// Tenant routing key contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid address segment '{0}'")]
    InvalidAddressSegment(String),

    /// Destination is not under the local address.
    #[error("destination {destination} is not under local address {prefix}")]
    ForeignDestination { destination: String, prefix: String },

    /// Discovery request needs `ILP-Peer-Name`.
    #[error("missing ILP-Peer-Name header")]
    MissingPeerName,

    /// A value cannot be carried in the named header.
    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// Peer answered with a non-2xx status.
    #[error("peer responded with status {0}")]
    UpstreamNonSuccess(u16),

    /// Configuration must be discovered but no handler can do it.
    #[error("handler required to discover configuration")]
    ConfigurationUnavailable,

    /// Parent rejected the discovery request.
    #[error("configuration discovery rejected: {code} {message}")]
    DiscoveryRejected { code: String, message: String },

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("malformed packet: {0}")]
    Packet(#[from] PacketError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),

    /// Listener could not be bound.
    #[error("failed to start listener: {0}")]
    Listener(#[source] std::io::Error),
}

impl BridgeError {
    /// Status code written when this error ends an inbound request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::Unauthorized => StatusCode::UNAUTHORIZED,
            BridgeError::NotConnected
            | BridgeError::NoHandlerRegistered
            | BridgeError::UpstreamNonSuccess(_)
            | BridgeError::DiscoveryRejected { .. }
            | BridgeError::Transport(_) => StatusCode::BAD_GATEWAY,
            BridgeError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            BridgeError::InvalidAddressSegment(_)
            | BridgeError::ForeignDestination { .. }
            | BridgeError::MissingPeerName
            | BridgeError::InvalidHeader(_)
            | BridgeError::Packet(_) => StatusCode::BAD_REQUEST,
            BridgeError::ConfigurationUnavailable
            | BridgeError::Auth(_)
            | BridgeError::Handler(_)
            | BridgeError::Listener(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(BridgeError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BridgeError::NotConnected.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(BridgeError::NoHandlerRegistered.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(BridgeError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            BridgeError::ConfigurationUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(BridgeError::NotConnected.to_string(), "server is closed");
        assert_eq!(
            BridgeError::UpstreamNonSuccess(503).to_string(),
            "peer responded with status 503"
        );
        assert_eq!(
            BridgeError::ConfigurationUnavailable.to_string(),
            "handler required to discover configuration"
        );
        assert!(BridgeError::PayloadTooLarge.to_string().contains("32767"));
    }
}
