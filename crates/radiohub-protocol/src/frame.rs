//! HCI frame encoding/decoding.
//!
//! A frame is the unit of exchange with the radio module:
//!
//! ```text
//! +--------+--------+------------------+---------+---------+
//! | sap_id | msg_id | payload[0..N]    | crc_lo  | crc_hi  |
//! +--------+--------+------------------+---------+---------+
//! ```
//!
//! The trailer is CRC-16/ISO-HDLC (poly 0x1021 reflected, init 0xFFFF,
//! xorout 0xFFFF) over the header and payload bytes, transmitted
//! little-endian.

use crc::{Crc, CRC_16_IBM_SDLC};

use crate::error::ProtocolError;

/// Minimum frame size: 2 header bytes + 2 trailer bytes, payload may be empty.
pub const MIN_FRAME_SIZE: usize = 4;

/// CRC-16/ISO-HDLC, the X.25 link-layer checksum.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// One complete HCI message.
///
/// `sap_id` selects the owning service access point, `msg_id` the specific
/// request, response, or event within that service. The payload layout is
/// known only to the owning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Service access point id.
    pub sap_id: u8,
    /// Message id within the service access point.
    pub msg_id: u8,
    /// Message payload, interpreted by the owning service.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(sap_id: u8, msg_id: u8, payload: impl Into<Vec<u8>>) -> Self {
        Frame {
            sap_id,
            msg_id,
            payload: payload.into(),
        }
    }

    /// Encode the frame, appending the CRC trailer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload.len() + MIN_FRAME_SIZE);
        buf.push(self.sap_id);
        buf.push(self.msg_id);
        buf.extend_from_slice(&self.payload);
        let crc = CRC16.checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decode a de-framed byte sequence, verifying the CRC trailer.
    ///
    /// Fails with [`ProtocolError::FrameTooShort`] below 4 bytes and with
    /// [`ProtocolError::CrcMismatch`] when the trailer disagrees with the
    /// recomputed checksum; callers must drop such frames without reading
    /// any field. Unrecognized sap/msg ids are not a decode error; routing
    /// them is the dispatcher's job.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: MIN_FRAME_SIZE,
                actual: data.len(),
            });
        }

        let (body, trailer) = data.split_at(data.len() - 2);
        let received = u16::from_le_bytes([trailer[0], trailer[1]]);
        let computed = CRC16.checksum(body);
        if computed != received {
            return Err(ProtocolError::CrcMismatch { computed, received });
        }

        Ok(Frame {
            sap_id: body[0],
            msg_id: body[1],
            payload: body[2..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_payload() {
        // CRC-16/ISO-HDLC over bytes 01 01 is 0x0716.
        let frame = Frame::new(0x01, 0x01, Vec::new());
        assert_eq!(frame.encode(), vec![0x01, 0x01, 0x16, 0x07]);
    }

    #[test]
    fn test_crc_check_value() {
        // Published check value for CRC-16/ISO-HDLC.
        assert_eq!(CRC16.checksum(b"123456789"), 0x906E);
    }

    #[test]
    fn test_round_trip() {
        let frame = Frame::new(0x0A, 0x21, vec![0x00, 0xC0, 0xDB, 0xFF]);
        let decoded = Frame::decode(&frame.encode()).expect("valid frame");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_round_trip_empty_payload() {
        let frame = Frame::new(0xA0, 0x05, Vec::new());
        let decoded = Frame::decode(&frame.encode()).expect("valid frame");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_too_short() {
        for len in 0..MIN_FRAME_SIZE {
            let err = Frame::decode(&vec![0u8; len]).unwrap_err();
            assert_eq!(
                err,
                ProtocolError::FrameTooShort {
                    expected: MIN_FRAME_SIZE,
                    actual: len,
                }
            );
        }
    }

    #[test]
    fn test_single_bit_flip_is_detected() {
        let wire = Frame::new(0x01, 0x03, vec![0x11, 0x22, 0x33]).encode();

        // Flip every bit of the header and payload in turn; the CRC must
        // catch each one.
        for byte in 0..wire.len() - 2 {
            for bit in 0..8 {
                let mut corrupted = wire.clone();
                corrupted[byte] ^= 1 << bit;
                let err = Frame::decode(&corrupted).unwrap_err();
                assert!(
                    matches!(err, ProtocolError::CrcMismatch { .. }),
                    "flip of byte {} bit {} not detected",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_corrupted_trailer_rejected() {
        let mut wire = Frame::new(0x01, 0x02, vec![0x00]).encode();
        let last = wire.len() - 1;
        wire[last] ^= 0x01;
        assert!(matches!(
            Frame::decode(&wire),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }
}
