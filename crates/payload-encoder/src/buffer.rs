//! Fixed-capacity payload buffer

use std::io;

/// Largest event payload the cloud transport accepts
pub const MAX_EVENT_DATA_LENGTH: usize = 1024;

/// Reusable payload buffer with a hard capacity.
///
/// One byte of the capacity stays reserved for a terminator, so the content
/// never exceeds `capacity - 1` bytes. Storage is allocated once.
#[derive(Debug, Clone)]
pub struct EncodedBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl EncodedBuffer {
    /// Create a buffer holding at most `capacity - 1` bytes of content
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Total capacity, terminator included
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum content length
    pub fn limit(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop all content
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content as text. Empty if the bytes are not UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }

    /// Writer that refuses any write crossing the limit
    pub(crate) fn writer(&mut self) -> BoundedWriter<'_> {
        BoundedWriter { buffer: self }
    }
}

impl Default for EncodedBuffer {
    fn default() -> Self {
        Self::new(MAX_EVENT_DATA_LENGTH + 1)
    }
}

pub(crate) struct BoundedWriter<'a> {
    buffer: &'a mut EncodedBuffer,
}

impl io::Write for BoundedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.buffer.limit() - self.buffer.bytes.len();
        if buf.len() > remaining {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "payload capacity exceeded",
            ));
        }
        self.buffer.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
