//! Interledger packet codec.
//!
//! # Data Flow
//! ```text
//! HTTP body (raw bytes)
//!     → PacketType::of (first byte)
//!     → types.rs (Prepare / Fulfill / Reject envelopes)
//!     → oer.rs (variable-length octet strings, fixed-width integers)
//!
//! Discovery (ILDCP):
//!     ildcp.rs builds the `peer.config` Prepare and reads/writes the
//!     Fulfill that carries the node's address, asset code and scale
//! ```
//!
//! # Design Decisions
//! - Decoding never panics; every malformed buffer is a `PacketError`
//! - Only the fields the bridge needs are interpreted, data is kept opaque

pub mod ildcp;
pub mod oer;
pub mod types;

use thiserror::Error;

pub use ildcp::{IldcpRequest, IldcpResponse, ILDCP_DESTINATION};
pub use types::{Fulfill, Prepare, Reject};

/// Largest packet the bridge accepts or forwards, in bytes.
pub const MAX_PACKET_SIZE: usize = 32767;

/// Type tag carried in the first byte of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Prepare = 12,
    Fulfill = 13,
    Reject = 14,
}

impl PacketType {
    /// Peek at the type tag of a raw packet.
    pub fn of(buf: &[u8]) -> Result<Self, PacketError> {
        let tag = *buf.first().ok_or(PacketError::UnexpectedEof)?;
        Self::try_from(tag)
    }
}

impl TryFrom<u8> for PacketType {
    type Error = PacketError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            12 => Ok(PacketType::Prepare),
            13 => Ok(PacketType::Fulfill),
            14 => Ok(PacketType::Reject),
            other => Err(PacketError::UnknownType(other)),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketType::Prepare => write!(f, "Prepare"),
            PacketType::Fulfill => write!(f, "Fulfill"),
            PacketType::Reject => write!(f, "Reject"),
        }
    }
}

/// Errors produced while decoding packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer ended before a field was complete.
    #[error("unexpected end of packet")]
    UnexpectedEof,

    /// First byte is not a known packet type.
    #[error("unknown packet type {0}")]
    UnknownType(u8),

    /// Packet decoded as a different type than requested.
    #[error("expected {expected} packet, got {actual}")]
    WrongType {
        expected: PacketType,
        actual: PacketType,
    },

    /// Length prefix is malformed or does not fit in memory.
    #[error("invalid length prefix")]
    InvalidLength,

    /// Bytes left over after the packet envelope.
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// Expiry timestamp is not `YYYYMMDDHHmmssfff`.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// A textual field is not valid UTF-8.
    #[error("field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_peek() {
        assert_eq!(PacketType::of(&[12, 0]).unwrap(), PacketType::Prepare);
        assert_eq!(PacketType::of(&[14]).unwrap(), PacketType::Reject);
        assert_eq!(PacketType::of(&[]), Err(PacketError::UnexpectedEof));
        assert_eq!(PacketType::of(&[1]), Err(PacketError::UnknownType(1)));
    }
}
