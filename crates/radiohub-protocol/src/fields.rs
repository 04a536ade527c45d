//! Positional field access over a frame payload.
//!
//! Message payloads are fixed-format: each field lives at an offset known
//! from the message contract, with no per-field length prefix. The reader
//! checks every access against the payload length and reports
//! [`ProtocolError::TruncatedPayload`] instead of panicking, so a short
//! firmware reply becomes a typed error rather than a wrong read.

use chrono::{DateTime, Utc};

use crate::error::ProtocolError;

/// Offset of the status byte in a response payload.
pub const STATUS_INDEX: usize = 0;
/// Offset of the first data field in an event payload.
pub const EVENT_DATA_INDEX: usize = 0;
/// Offset of the first data field in a response payload (after the status byte).
pub const RESPONSE_DATA_INDEX: usize = 1;

/// Read-only view over one payload.
#[derive(Debug, Clone, Copy)]
pub struct PayloadReader<'a> {
    payload: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    /// Create a reader over a payload.
    pub fn new(payload: &'a [u8]) -> Self {
        PayloadReader { payload }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], ProtocolError> {
        let end = offset.saturating_add(len);
        if end > self.payload.len() {
            return Err(ProtocolError::TruncatedPayload {
                needed: end,
                actual: self.payload.len(),
            });
        }
        Ok(&self.payload[offset..end])
    }

    /// Unsigned byte at `offset`.
    pub fn u8_at(&self, offset: usize) -> Result<u8, ProtocolError> {
        Ok(self.slice(offset, 1)?[0])
    }

    /// Signed byte at `offset`.
    pub fn i8_at(&self, offset: usize) -> Result<i8, ProtocolError> {
        Ok(self.u8_at(offset)? as i8)
    }

    /// The response status byte.
    pub fn status(&self) -> Result<u8, ProtocolError> {
        self.u8_at(STATUS_INDEX)
    }

    /// Little-endian u16 at `offset`.
    pub fn u16_at(&self, offset: usize) -> Result<u16, ProtocolError> {
        let b = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Big-endian u16 at `offset`.
    pub fn u16_be_at(&self, offset: usize) -> Result<u16, ProtocolError> {
        let b = self.slice(offset, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Little-endian u32 at `offset`.
    pub fn u32_at(&self, offset: usize) -> Result<u32, ProtocolError> {
        let b = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Big-endian u32 at `offset`.
    pub fn u32_be_at(&self, offset: usize) -> Result<u32, ProtocolError> {
        let b = self.slice(offset, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// UTF-8 string of `len` bytes at `offset`.
    pub fn str_at(&self, offset: usize, len: usize) -> Result<String, ProtocolError> {
        let b = self.slice(offset, len)?;
        std::str::from_utf8(b)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// UTF-8 string from `offset` to the end of the payload.
    pub fn str_to_end(&self, offset: usize) -> Result<String, ProtocolError> {
        self.str_at(offset, self.remainder(offset)?)
    }

    /// Hex rendering of `len` bytes at `offset`, `-`-separated pairs in
    /// natural byte order.
    pub fn hex_at(&self, offset: usize, len: usize) -> Result<String, ProtocolError> {
        Ok(hex_join(self.slice(offset, len)?.iter()))
    }

    /// Hex rendering from `offset` to the end of the payload.
    pub fn hex_to_end(&self, offset: usize) -> Result<String, ProtocolError> {
        self.hex_at(offset, self.remainder(offset)?)
    }

    /// Hex rendering of `len` bytes at `offset` in reversed byte order.
    ///
    /// EUIs and node addresses are transmitted least-significant-byte first;
    /// this renders them most-significant-byte first for display.
    pub fn hex_lsb_at(&self, offset: usize, len: usize) -> Result<String, ProtocolError> {
        Ok(hex_join(self.slice(offset, len)?.iter().rev()))
    }

    /// Little-endian u32 Unix timestamp at `offset` as UTC calendar time.
    pub fn datetime_at(&self, offset: usize) -> Result<DateTime<Utc>, ProtocolError> {
        let secs = self.u32_at(offset)?;
        // Every u32 seconds value is within chrono's representable range.
        Ok(DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default())
    }

    fn remainder(&self, offset: usize) -> Result<usize, ProtocolError> {
        if offset > self.payload.len() {
            return Err(ProtocolError::TruncatedPayload {
                needed: offset,
                actual: self.payload.len(),
            });
        }
        Ok(self.payload.len() - offset)
    }
}

/// Join bytes as `-`-separated lowercase hex pairs.
fn hex_join<'a>(bytes: impl Iterator<Item = &'a u8>) -> String {
    bytes
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accessors() {
        let payload = [0x01u8, 0xFF, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let r = PayloadReader::new(&payload);

        assert_eq!(r.u8_at(0).unwrap(), 0x01);
        assert_eq!(r.i8_at(1).unwrap(), -1);
        assert_eq!(r.u16_at(2).unwrap(), 0x1234);
        assert_eq!(r.u16_be_at(2).unwrap(), 0x3412);
        assert_eq!(r.u32_at(4).unwrap(), 0x12345678);
        assert_eq!(r.u32_be_at(4).unwrap(), 0x78563412);
    }

    #[test]
    fn test_status_is_byte_zero() {
        let r = PayloadReader::new(&[0x07, 0x00]);
        assert_eq!(r.status().unwrap(), 0x07);
    }

    #[test]
    fn test_read_past_end_is_truncated_payload() {
        let payload = [0x00u8, 0x01, 0x02];
        let r = PayloadReader::new(&payload);

        assert_eq!(
            r.u32_at(1).unwrap_err(),
            ProtocolError::TruncatedPayload { needed: 5, actual: 3 }
        );
        assert_eq!(
            r.u8_at(3).unwrap_err(),
            ProtocolError::TruncatedPayload { needed: 4, actual: 3 }
        );
        assert!(r.str_to_end(4).is_err());
    }

    #[test]
    fn test_string_fields() {
        let payload = b"\x00WiMOD Mesh";
        let r = PayloadReader::new(payload);

        assert_eq!(r.str_at(1, 5).unwrap(), "WiMOD");
        assert_eq!(r.str_to_end(7).unwrap(), "Mesh");
        assert_eq!(r.str_to_end(payload.len()).unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8() {
        let r = PayloadReader::new(&[0xFF, 0xFE]);
        assert_eq!(r.str_at(0, 2).unwrap_err(), ProtocolError::InvalidUtf8);
    }

    #[test]
    fn test_hex_renderings() {
        let payload = [0x01u8, 0x02, 0xAB, 0xCD];
        let r = PayloadReader::new(&payload);

        assert_eq!(r.hex_at(0, 4).unwrap(), "01-02-ab-cd");
        assert_eq!(r.hex_lsb_at(0, 4).unwrap(), "cd-ab-02-01");
        assert_eq!(r.hex_to_end(2).unwrap(), "ab-cd");
        assert_eq!(r.hex_at(1, 1).unwrap(), "02");
    }

    #[test]
    fn test_datetime_at() {
        // 1700000000 = 14.11.2023 22:13:20 UTC
        let payload = 1_700_000_000u32.to_le_bytes();
        let r = PayloadReader::new(&payload);
        let dt = r.datetime_at(0).unwrap();
        assert_eq!(dt.format("%d.%m.%Y %H:%M:%S").to_string(), "14.11.2023 22:13:20");
    }
}
