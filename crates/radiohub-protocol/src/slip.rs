//! SLIP framing (RFC 1055).
//!
//! The radio module delimits HCI frames with the SLIP END byte and escapes
//! END/ESC bytes occurring inside a frame:
//!
//! ```text
//! END      = 0xC0   frame delimiter
//! ESC      = 0xDB   escape introducer
//! ESC_END  = 0xDC   escaped END
//! ESC_ESC  = 0xDD   escaped ESC
//! ```
//!
//! Encoding is stateless. Decoding keeps a reassembly buffer because the
//! serial port hands over arbitrary chunks; a frame is only emitted once its
//! terminating END has been seen.

use bytes::{BufMut, BytesMut};

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape introducer.
pub const ESC: u8 = 0xDB;
/// Escaped frame delimiter.
pub const ESC_END: u8 = 0xDC;
/// Escaped escape.
pub const ESC_ESC: u8 = 0xDD;

/// Maximum decoded frame size buffered during reassembly.
///
/// The wire format itself carries no length bound, so a stream that never
/// produces a terminating END would otherwise grow the buffer without limit.
/// Frames exceeding this are dropped and the decoder resynchronizes at the
/// next END.
pub const MAX_FRAME_SIZE: usize = 1024;

/// Encode one frame for transmission.
///
/// The output is wrapped in leading and trailing END delimiters so a frame
/// always starts from a clean boundary, even after line noise.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 2);
    out.push(END);
    for &b in data {
        match b {
            END => {
                out.push(ESC);
                out.push(ESC_END);
            }
            ESC => {
                out.push(ESC);
                out.push(ESC_ESC);
            }
            _ => out.push(b),
        }
    }
    out.push(END);
    out
}

/// Incremental SLIP decoder.
///
/// Feed raw serial chunks with [`SlipDecoder::push`]; complete de-escaped
/// frames come back in arrival order. Partial frames stay buffered across
/// calls, so a frame split over any chunk boundary decodes the same as one
/// fed whole.
#[derive(Debug, Default)]
pub struct SlipDecoder {
    /// De-escaped bytes of the frame currently being reassembled.
    buffer: BytesMut,
    /// Last byte was ESC.
    escaped: bool,
    /// Skipping until the next END after a protocol violation or overflow.
    discarding: bool,
}

impl SlipDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        SlipDecoder {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
            escaped: false,
            discarding: false,
        }
    }

    /// Add received data, returning any frames completed by it.
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();

        for &b in data {
            if self.discarding {
                if b == END {
                    self.discarding = false;
                }
                continue;
            }

            if self.escaped {
                self.escaped = false;
                match b {
                    ESC_END => self.put(END),
                    ESC_ESC => self.put(ESC),
                    _ => {
                        log::warn!("invalid SLIP escape 0x{:02X}, dropping frame", b);
                        self.resync();
                    }
                }
                continue;
            }

            match b {
                END => {
                    // Back-to-back delimiters produce empty frames; skip them.
                    if !self.buffer.is_empty() {
                        frames.push(self.buffer.split().to_vec());
                    }
                }
                ESC => self.escaped = true,
                _ => self.put(b),
            }
        }

        frames
    }

    /// Number of bytes buffered for an incomplete frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partially reassembled frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.escaped = false;
        self.discarding = false;
    }

    fn put(&mut self, b: u8) {
        if self.buffer.len() >= MAX_FRAME_SIZE {
            log::warn!(
                "SLIP frame exceeds {} bytes, dropping and resynchronizing",
                MAX_FRAME_SIZE
            );
            self.resync();
            return;
        }
        self.buffer.put_u8(b);
    }

    fn resync(&mut self) {
        self.buffer.clear();
        self.escaped = false;
        self.discarding = true;
    }
}
