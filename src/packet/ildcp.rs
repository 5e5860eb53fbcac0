//! Interledger Dynamic Configuration Protocol (ILDCP).
//!
//! A node learns its own address by sending a zero-amount Prepare to
//! `peer.config`; the parent answers with a Fulfill whose data carries the
//! assigned address and asset details.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::oer::{write_var_octet_string, Reader};
use super::{Fulfill, PacketError, Prepare};

/// Reserved destination of discovery requests.
pub const ILDCP_DESTINATION: &str = "peer.config";

/// Fulfillment used by peer protocols: 32 zero bytes.
pub const PEER_PROTOCOL_FULFILLMENT: [u8; 32] = [0u8; 32];

const REQUEST_EXPIRY_SECS: i64 = 60;

/// SHA-256 of [`PEER_PROTOCOL_FULFILLMENT`].
pub fn peer_protocol_condition() -> [u8; 32] {
    Sha256::digest(PEER_PROTOCOL_FULFILLMENT).into()
}

/// Discovery request sent to the parent.
#[derive(Debug, Clone)]
pub struct IldcpRequest {
    pub expires_at: chrono::DateTime<Utc>,
}

impl IldcpRequest {
    pub fn new() -> Self {
        Self {
            expires_at: Utc::now() + chrono::Duration::seconds(REQUEST_EXPIRY_SECS),
        }
    }

    pub fn to_prepare(&self) -> Prepare {
        Prepare {
            amount: 0,
            expires_at: self.expires_at,
            execution_condition: peer_protocol_condition(),
            destination: ILDCP_DESTINATION.to_string(),
            data: Bytes::new(),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        self.to_prepare().to_bytes()
    }
}

impl Default for IldcpRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Node configuration learned through discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IldcpResponse {
    pub client_address: String,
    pub asset_scale: u8,
    pub asset_code: String,
}

impl IldcpResponse {
    /// Same asset details under a different address.
    pub fn with_client_address(&self, client_address: impl Into<String>) -> Self {
        Self {
            client_address: client_address.into(),
            ..self.clone()
        }
    }

    pub fn to_fulfill(&self) -> Fulfill {
        let mut data = BytesMut::new();
        write_var_octet_string(&mut data, self.client_address.as_bytes());
        data.put_u8(self.asset_scale);
        write_var_octet_string(&mut data, self.asset_code.as_bytes());
        Fulfill {
            fulfillment: PEER_PROTOCOL_FULFILLMENT,
            data: data.freeze(),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        self.to_fulfill().to_bytes()
    }

    pub fn from_fulfill(fulfill: &Fulfill) -> Result<Self, PacketError> {
        let mut reader = Reader::new(&fulfill.data);
        let client_address = reader.read_var_str("client_address")?;
        let asset_scale = reader.read_u8()?;
        let asset_code = reader.read_var_str("asset_code")?;
        Ok(Self {
            client_address,
            asset_scale,
            asset_code,
        })
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        Self::from_fulfill(&Fulfill::from_bytes(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_targets_peer_config() {
        let bytes = IldcpRequest::new().to_bytes();
        let prepare = Prepare::from_bytes(&bytes).unwrap();
        assert_eq!(prepare.destination, ILDCP_DESTINATION);
        assert_eq!(prepare.amount, 0);
        assert_eq!(prepare.execution_condition, peer_protocol_condition());
    }

    #[test]
    fn test_condition_is_hash_of_zero_fulfillment() {
        let condition = peer_protocol_condition();
        assert_eq!(condition[0], 0x66);
        assert_eq!(condition[31], 0x25);
    }

    #[test]
    fn test_response_decodes() {
        let response = IldcpResponse {
            client_address: "g.node1.alice".to_string(),
            asset_scale: 9,
            asset_code: "XRP".to_string(),
        };
        let decoded = IldcpResponse::from_bytes(&response.to_bytes()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_with_client_address_keeps_asset() {
        let base = IldcpResponse {
            client_address: "g.node1".to_string(),
            asset_scale: 2,
            asset_code: "USD".to_string(),
        };
        let tenant = base.with_client_address("g.node1.bob");
        assert_eq!(tenant.client_address, "g.node1.bob");
        assert_eq!(tenant.asset_code, "USD");
        assert_eq!(tenant.asset_scale, 2);
    }
}
