//! Auto-growing binary buffer writer.

use crate::{align_up, BufferError};

/// A binary buffer writer that appends big-endian data to an owned,
/// auto-growing buffer.
///
/// Positions handed out by [`Writer::len`] are logical offsets. They stay
/// valid across growth, so a caller can remember where a word was written
/// and [`patch_u32`](Writer::patch_u32) it later even after the backing
/// allocation has moved.
///
/// # Example
///
/// ```
/// use blobmsg_buffers::Writer;
///
/// let mut writer = Writer::new();
/// let at = writer.len();
/// writer.u32(0);
/// writer.utf8("abc");
/// writer.pad(4);
/// writer.patch_u32(at, 7).unwrap();
/// assert_eq!(writer.flush(), vec![0, 0, 0, 7, b'a', b'b', b'c', 0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    uint8: Vec<u8>,
}

impl Writer {
    /// Default initial allocation size.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a writer with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY).
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a writer that can hold `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Discards everything written while keeping the allocation.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Number of bytes written so far; also the offset of the next write.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Drops everything written after `len`, rolling back a partial write.
    pub fn truncate(&mut self, len: usize) {
        self.uint8.truncate(len);
    }

    /// Returns the written bytes without consuming them.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Takes the written bytes, leaving the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Appends raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }

    /// Appends the UTF-8 bytes of `s` (no terminator).
    pub fn utf8(&mut self, s: &str) {
        self.uint8.extend_from_slice(s.as_bytes());
    }

    /// Appends `n` zero bytes.
    pub fn zeros(&mut self, n: usize) {
        self.uint8.resize(self.uint8.len() + n, 0);
    }

    /// Zero-fills up to the next multiple of `align` (a power of two).
    pub fn pad(&mut self, align: usize) {
        let len = self.uint8.len();
        self.uint8.resize(align_up(len, align), 0);
    }

    /// Overwrites the big-endian word at `offset`.
    ///
    /// Fails with [`BufferError::EndOfBuffer`] if the word was never written.
    pub fn patch_u32(&mut self, offset: usize, val: u32) -> Result<(), BufferError> {
        let end = offset.checked_add(4).ok_or(BufferError::Overflow)?;
        let dst = self
            .uint8
            .get_mut(offset..end)
            .ok_or(BufferError::EndOfBuffer)?;
        dst.copy_from_slice(&val.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian() {
        let mut w = Writer::new();
        w.u16(0x0102);
        w.u32(0x0304_0506);
        w.u64(0x0708_090a_0b0c_0d0e);
        assert_eq!(
            w.flush(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]
        );
        assert!(w.is_empty());
    }

    #[test]
    fn pad_is_noop_when_aligned() {
        let mut w = Writer::new();
        w.u32(1);
        w.pad(4);
        assert_eq!(w.len(), 4);
        w.u8(1);
        w.pad(4);
        assert_eq!(w.len(), 8);
        assert_eq!(&w.as_slice()[5..], &[0, 0, 0]);
    }

    #[test]
    fn patch_survives_growth() {
        let mut w = Writer::with_capacity(4);
        w.u32(0);
        w.zeros(4096);
        w.patch_u32(0, 0xdead_beef).unwrap();
        assert_eq!(&w.as_slice()[..4], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn patch_out_of_range_fails() {
        let mut w = Writer::new();
        w.u16(0);
        assert_eq!(w.patch_u32(0, 1), Err(BufferError::EndOfBuffer));
        assert_eq!(w.patch_u32(usize::MAX, 1), Err(BufferError::Overflow));
    }

    #[test]
    fn truncate_rolls_back() {
        let mut w = Writer::new();
        w.u32(1);
        let mark = w.len();
        w.utf8("partial");
        w.truncate(mark);
        assert_eq!(w.flush(), vec![0, 0, 0, 1]);
    }
}
