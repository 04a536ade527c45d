//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while framing, decoding, or routing HCI messages.
///
/// None of these are fatal: the dispatcher recovers every variant at its
/// boundary and reports it to the caller, then keeps processing the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to carry a header and CRC trailer.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// The CRC trailer does not match the frame contents.
    #[error("CRC mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    CrcMismatch {
        /// CRC computed over header + payload.
        computed: u16,
        /// CRC carried in the frame trailer.
        received: u16,
    },

    /// No service access point is registered under this id.
    #[error("unknown service access point called: 0x{0:02X}")]
    UnknownSap(u8),

    /// No service access point is registered under this name.
    #[error("unknown service access point called: {0}")]
    UnknownSapName(String),

    /// A service access point id was registered twice.
    #[error("duplicate service access point id: 0x{0:02X}")]
    DuplicateSap(u8),

    /// The message id is in neither the response nor the event table.
    #[error("unhandled message identifier received: 0x{0:02X}")]
    UnknownMessageId(u8),

    /// No request encoder is registered under this name.
    #[error("unhandled encoder called: {0}")]
    UnknownEncoder(String),

    /// A field read past the end of the payload.
    #[error("truncated payload: need {needed} bytes, got {actual}")]
    TruncatedPayload {
        /// Bytes required to complete the read.
        needed: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// A string field holds invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A request parameter is missing or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
