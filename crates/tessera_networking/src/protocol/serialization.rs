//! # Payload Serialization
//!
//! Bounded little-endian cursors for building and parsing payloads.
//!
//! ## Design
//!
//! - Writers refuse to grow past the frame payload cap and report it with `false`
//! - Readers never index past the slice they were given

use super::frame::MAX_PAYLOAD_LEN;

/// Payload writer over a growable buffer capped at [`MAX_PAYLOAD_LEN`].
#[derive(Debug, Default)]
pub struct PayloadWriter {
    buffer: Vec<u8>,
}

impl PayloadWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity.min(MAX_PAYLOAD_LEN)),
        }
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes still available before the cap.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        MAX_PAYLOAD_LEN - self.buffer.len()
    }

    /// Written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.buffer.extend_from_slice(bytes);
        true
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        self.write_bytes(&[value])
    }

    /// Writes a u16 in little-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes an i32 in little-endian format.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes an f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }
}

/// Payload reader.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> PayloadReader<'a> {
    /// Creates a reader over `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Current offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Reads `len` raw bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Some(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Reads a u16 in little-endian format.
    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads an i32 in little-endian format.
    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads an f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        self.read_array().map(f32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_reader_little_endian() {
        let mut writer = PayloadWriter::new();
        assert!(writer.write_u8(7));
        assert!(writer.write_u16(0x0102));
        assert!(writer.write_i32(-2));
        assert!(writer.write_f32(1.5));
        assert_eq!(&writer.as_slice()[..3], &[7, 0x02, 0x01]);

        let bytes = writer.into_inner();
        let mut reader = PayloadReader::new(&bytes);
        assert_eq!(reader.read_u8(), Some(7));
        assert_eq!(reader.read_u16(), Some(0x0102));
        assert_eq!(reader.read_i32(), Some(-2));
        assert_eq!(reader.read_f32(), Some(1.5));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_u8(), None);
    }

    #[test]
    fn test_writer_cap() {
        let mut writer = PayloadWriter::new();
        assert!(writer.write_bytes(&vec![0; MAX_PAYLOAD_LEN - 1]));
        assert!(!writer.write_u16(1));
        assert!(writer.write_u8(1));
        assert_eq!(writer.remaining(), 0);
        assert!(!writer.write_u8(1));
        assert_eq!(writer.len(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_reader_short_read_does_not_advance() {
        let mut reader = PayloadReader::new(&[1, 2, 3]);
        assert_eq!(reader.read_i32(), None);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16(), Some(0x0201));
    }
}
