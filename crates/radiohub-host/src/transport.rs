//! Byte transport abstraction.
//!
//! The hub is transport-agnostic: anything that can hand over whatever
//! bytes are currently pending and accept outbound bytes works, whether a
//! serial port opened with a zero timeout, a TCP socket in non-blocking
//! mode, or an in-memory double in tests.

use std::collections::VecDeque;
use std::io;

/// A byte-oriented, non-blocking transport.
pub trait Transport {
    /// Return the bytes currently available, possibly none.
    ///
    /// An empty vector is the normal "nothing pending" result, not an
    /// error or end-of-stream.
    fn read(&mut self) -> io::Result<Vec<u8>>;

    /// Write bytes to the device.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// In-memory transport for tests and examples.
///
/// `read` hands out queued chunks one per call, preserving the chunk
/// boundaries they were queued with; `write` records everything sent.
#[derive(Debug, Default)]
pub struct MockTransport {
    incoming: VecDeque<Vec<u8>>,
    /// Chunks written by the hub, in order.
    pub written: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queue a chunk for a later `read`.
    pub fn queue(&mut self, chunk: impl Into<Vec<u8>>) {
        self.incoming.push_back(chunk.into());
    }
}

impl Transport for MockTransport {
    fn read(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.incoming.pop_front().unwrap_or_default())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.push(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_preserves_chunk_boundaries() {
        let mut transport = MockTransport::new();
        transport.queue(vec![0x01, 0x02]);
        transport.queue(vec![0x03]);

        assert_eq!(transport.read().unwrap(), vec![0x01, 0x02]);
        assert_eq!(transport.read().unwrap(), vec![0x03]);
        assert!(transport.read().unwrap().is_empty());
    }

    #[test]
    fn test_mock_transport_records_writes() {
        let mut transport = MockTransport::new();
        transport.write(&[0xC0, 0x01]).unwrap();
        assert_eq!(transport.written, vec![vec![0xC0, 0x01]]);
    }
}
