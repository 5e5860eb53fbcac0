//! Prepare, Fulfill and Reject envelopes.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::oer::{write_var_octet_string, Reader};
use super::{PacketError, PacketType};

const TIMESTAMP_LEN: usize = 17;

/// Conditional payment request travelling towards `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare {
    pub amount: u64,
    pub expires_at: DateTime<Utc>,
    pub execution_condition: [u8; 32],
    pub destination: String,
    pub data: Bytes,
}

/// Successful terminal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfill {
    pub fulfillment: [u8; 32],
    pub data: Bytes,
}

/// Failed terminal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    /// Three character error code, e.g. `F02`.
    pub code: String,
    pub triggered_by: String,
    pub message: String,
    pub data: Bytes,
}

impl Prepare {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        let mut reader = open_envelope(buf, PacketType::Prepare)?;
        let amount = reader.read_u64()?;
        let expires_at = read_timestamp(&mut reader)?;
        let execution_condition = reader.read_array::<32>()?;
        let destination = reader.read_var_str("destination")?;
        let data = Bytes::copy_from_slice(reader.read_var_octet_string()?);
        Ok(Self {
            amount,
            expires_at,
            execution_condition,
            destination,
            data,
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut content = BytesMut::with_capacity(64 + self.destination.len() + self.data.len());
        content.put_u64(self.amount);
        content.put_slice(self.expires_at.format("%Y%m%d%H%M%S%3f").to_string().as_bytes());
        content.put_slice(&self.execution_condition);
        write_var_octet_string(&mut content, self.destination.as_bytes());
        write_var_octet_string(&mut content, &self.data);
        seal_envelope(PacketType::Prepare, &content)
    }
}

impl Fulfill {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        let mut reader = open_envelope(buf, PacketType::Fulfill)?;
        let fulfillment = reader.read_array::<32>()?;
        let data = Bytes::copy_from_slice(reader.read_var_octet_string()?);
        Ok(Self { fulfillment, data })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut content = BytesMut::with_capacity(34 + self.data.len());
        content.put_slice(&self.fulfillment);
        write_var_octet_string(&mut content, &self.data);
        seal_envelope(PacketType::Fulfill, &content)
    }
}

impl Reject {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        let mut reader = open_envelope(buf, PacketType::Reject)?;
        let code = std::str::from_utf8(reader.read_bytes(3)?)
            .map_err(|_| PacketError::InvalidUtf8("code"))?
            .to_owned();
        let triggered_by = reader.read_var_str("triggered_by")?;
        let message = reader.read_var_str("message")?;
        let data = Bytes::copy_from_slice(reader.read_var_octet_string()?);
        Ok(Self {
            code,
            triggered_by,
            message,
            data,
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut content = BytesMut::new();
        let mut code = [b' '; 3];
        for (slot, byte) in code.iter_mut().zip(self.code.bytes()) {
            *slot = byte;
        }
        content.put_slice(&code);
        write_var_octet_string(&mut content, self.triggered_by.as_bytes());
        write_var_octet_string(&mut content, self.message.as_bytes());
        write_var_octet_string(&mut content, &self.data);
        seal_envelope(PacketType::Reject, &content)
    }
}

/// Check the type tag and return a reader over the envelope contents.
fn open_envelope(buf: &[u8], expected: PacketType) -> Result<Reader<'_>, PacketError> {
    let mut outer = Reader::new(buf);
    let actual = PacketType::try_from(outer.read_u8()?)?;
    if actual != expected {
        return Err(PacketError::WrongType { expected, actual });
    }
    let contents = outer.read_var_octet_string()?;
    if outer.remaining() != 0 {
        return Err(PacketError::TrailingBytes(outer.remaining()));
    }
    Ok(Reader::new(contents))
}

fn seal_envelope(packet_type: PacketType, content: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(content.len() + 4);
    out.put_u8(packet_type as u8);
    write_var_octet_string(&mut out, content);
    out.freeze()
}

fn read_timestamp(reader: &mut Reader<'_>) -> Result<DateTime<Utc>, PacketError> {
    let raw = reader.read_bytes(TIMESTAMP_LEN)?;
    if !raw.iter().all(u8::is_ascii_digit) {
        return Err(PacketError::InvalidTimestamp);
    }
    // All ASCII digits, so slicing on byte offsets is safe.
    let text = std::str::from_utf8(raw).map_err(|_| PacketError::InvalidTimestamp)?;
    let naive = NaiveDateTime::parse_from_str(&text[..14], "%Y%m%d%H%M%S")
        .map_err(|_| PacketError::InvalidTimestamp)?;
    let millis: i64 = text[14..].parse().map_err(|_| PacketError::InvalidTimestamp)?;
    Ok(Utc.from_utc_datetime(&naive) + chrono::Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prepare() -> Prepare {
        Prepare {
            amount: 107,
            expires_at: Utc.with_ymd_and_hms(2017, 12, 23, 1, 21, 40).unwrap()
                + chrono::Duration::milliseconds(549),
            execution_condition: [7u8; 32],
            destination: "example.alice".to_string(),
            data: Bytes::from_static(b"hello"),
        }
    }

    #[test]
    fn test_prepare_layout() {
        let bytes = sample_prepare().to_bytes();
        assert_eq!(bytes[0], 12);
        // amount starts right after type tag and one-byte length
        assert_eq!(&bytes[2..10], &107u64.to_be_bytes());
        assert_eq!(&bytes[10..27], b"20171223012140549");
        assert_eq!(Prepare::from_bytes(&bytes).unwrap(), sample_prepare());
    }

    #[test]
    fn test_prepare_rejects_fulfill_buffer() {
        let fulfill = Fulfill {
            fulfillment: [0u8; 32],
            data: Bytes::new(),
        };
        let err = Prepare::from_bytes(&fulfill.to_bytes()).unwrap_err();
        assert_eq!(
            err,
            PacketError::WrongType {
                expected: PacketType::Prepare,
                actual: PacketType::Fulfill
            }
        );
    }

    #[test]
    fn test_truncated_prepare() {
        let bytes = sample_prepare().to_bytes();
        assert!(Prepare::from_bytes(&bytes[..20]).is_err());
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = sample_prepare().to_bytes().to_vec();
        bytes.push(0);
        assert_eq!(
            Prepare::from_bytes(&bytes),
            Err(PacketError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_reject_fields() {
        let reject = Reject {
            code: "F02".to_string(),
            triggered_by: "g.node1".to_string(),
            message: "unreachable".to_string(),
            data: Bytes::new(),
        };
        let bytes = reject.to_bytes();
        assert_eq!(&bytes[2..5], b"F02");
        let decoded = Reject::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.triggered_by, "g.node1");
        assert_eq!(decoded.message, "unreachable");
    }

    #[test]
    fn test_large_data_uses_long_length() {
        let mut prepare = sample_prepare();
        prepare.data = Bytes::from(vec![1u8; 1000]);
        let bytes = prepare.to_bytes();
        assert_eq!(bytes[1], 0x82);
        assert_eq!(Prepare::from_bytes(&bytes).unwrap().data.len(), 1000);
    }
}
