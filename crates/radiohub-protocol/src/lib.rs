//! Radio module HCI wire protocol
//!
//! This crate provides the byte-level protocol layer for talking to a LoRa
//! mesh radio module over a serial link. Every logical message is a frame:
//!
//! - **Header** (2 bytes): service access point id + message id
//! - **Payload** (0..N bytes): fixed-format fields owned by the service
//! - **Trailer** (2 bytes): CRC-16/ISO-HDLC over header + payload,
//!   little-endian
//!
//! Frames travel SLIP-encoded (RFC 1055) so that frame boundaries survive
//! an unreliable byte stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use radiohub_protocol::{Frame, SlipDecoder, slip};
//!
//! // Build and frame a request
//! let frame = Frame::new(0x01, 0x01, Vec::new());
//! let wire = slip::encode(&frame.encode());
//!
//! // Reassemble whatever the serial port hands us
//! let mut decoder = SlipDecoder::new();
//! for blob in decoder.push(&received) {
//!     let frame = Frame::decode(&blob)?;
//! }
//! ```

mod error;
mod fields;
mod frame;
pub mod slip;

pub use error::*;
pub use fields::*;
pub use frame::*;
pub use slip::SlipDecoder;
