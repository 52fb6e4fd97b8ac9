//! Binary buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader that reads data from a byte slice.
///
/// The reader maintains a cursor position and provides methods for reading
/// big-endian integer types and strings. Every read checks the remaining
/// length first; a failed read leaves the cursor where it was.
///
/// # Example
///
/// ```
/// use blobmsg_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8(), Ok(0x01));
/// assert_eq!(reader.u16(), Ok(0x0203));
/// assert!(reader.u16().is_err());
/// assert_eq!(reader.size(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Creates a reader from a slice with custom start and end positions.
    ///
    /// `end` is clamped to the slice length and `x` to `end`.
    pub fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        let end = end.min(uint8.len());
        let x = x.min(end);
        Self { uint8, x, end }
    }

    /// Resets the reader with a new byte slice.
    pub fn reset(&mut self, uint8: &'a [u8]) {
        self.x = 0;
        self.end = uint8.len();
        self.uint8 = uint8;
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end - self.x
    }

    /// Returns `true` once every byte up to `end` has been consumed.
    pub fn is_empty(&self) -> bool {
        self.x >= self.end
    }

    fn ensure(&self, n: usize) -> Result<(), BufferError> {
        if n > self.size() {
            return Err(BufferError::EndOfBuffer);
        }
        Ok(())
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        Ok(self.uint8[self.x])
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.ensure(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..x + size])
    }

    /// Returns the next `size` bytes without advancing the cursor.
    pub fn subarray(&self, size: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(size)?;
        Ok(&self.uint8[self.x..self.x + size])
    }

    /// Returns everything between the cursor and `end` without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.uint8[self.x..self.end]
    }

    /// Creates a new Reader over the next `size` bytes and advances the cursor.
    pub fn cut(&mut self, size: usize) -> Result<Reader<'a>, BufferError> {
        self.ensure(size)?;
        let slice = Reader::from_slice(self.uint8, self.x, self.x + size);
        self.x += size;
        Ok(slice)
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.buf(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        self.array().map(u16::from_be_bytes)
    }

    /// Reads an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        self.array().map(u32::from_be_bytes)
    }

    /// Reads an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        self.array().map(u64::from_be_bytes)
    }

    /// Reads a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        self.array().map(f64::from_be_bytes)
    }

    /// Reads a UTF-8 string of the given size.
    ///
    /// The cursor only advances when the bytes are present and valid.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bytes = self.subarray(size)?;
        let s = str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)?;
        self.x += size;
        Ok(s)
    }
}
