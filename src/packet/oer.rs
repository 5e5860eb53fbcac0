//! Octet Encoding Rules primitives used by the packet formats.

use bytes::{BufMut, BytesMut};

use super::PacketError;

/// Cursor over a borrowed packet buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u64(&mut self) -> Result<u64, PacketError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        let mut raw = [0u8; N];
        raw.copy_from_slice(self.read_bytes(N)?);
        Ok(raw)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PacketError> {
        if self.buf.len() < len {
            return Err(PacketError::UnexpectedEof);
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read a length determinant (short form below 128, long form otherwise).
    pub fn read_var_len(&mut self) -> Result<usize, PacketError> {
        let first = self.read_u8()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let count = (first & 0x7f) as usize;
        if count == 0 || count > std::mem::size_of::<usize>() {
            return Err(PacketError::InvalidLength);
        }
        let len = self
            .read_bytes(count)?
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        Ok(len)
    }

    pub fn read_var_octet_string(&mut self) -> Result<&'a [u8], PacketError> {
        let len = self.read_var_len()?;
        self.read_bytes(len)
    }

    pub fn read_var_str(&mut self, field: &'static str) -> Result<String, PacketError> {
        let raw = self.read_var_octet_string()?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| PacketError::InvalidUtf8(field))
    }
}

pub fn write_var_len(out: &mut BytesMut, len: usize) {
    if len < 0x80 {
        out.put_u8(len as u8);
        return;
    }
    let be = (len as u64).to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    out.put_u8(0x80 | (be.len() - skip) as u8);
    out.put_slice(&be[skip..]);
}

pub fn write_var_octet_string(out: &mut BytesMut, data: &[u8]) {
    write_var_len(out, data.len());
    out.put_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_lengths() {
        let mut out = BytesMut::new();
        write_var_len(&mut out, 5);
        write_var_len(&mut out, 300);
        assert_eq!(&out[..], &[5, 0x82, 0x01, 0x2c]);

        let mut reader = Reader::new(&out);
        assert_eq!(reader.read_var_len().unwrap(), 5);
        assert_eq!(reader.read_var_len().unwrap(), 300);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_zero_length_long_form_rejected() {
        let mut reader = Reader::new(&[0x80]);
        assert_eq!(reader.read_var_len(), Err(PacketError::InvalidLength));
    }

    #[test]
    fn test_octet_string_past_end() {
        let mut reader = Reader::new(&[4, 1, 2]);
        assert_eq!(reader.read_var_octet_string(), Err(PacketError::UnexpectedEof));
    }
}
