//! Binary buffer utilities for blobmsg.
//!
//! This crate provides the two byte-level primitives the attribute engine is
//! built on.
//!
//! # Overview
//!
//! - [`Reader`] - Reads big-endian data from a byte slice; every read is
//!   bounds-checked and reports [`BufferError::EndOfBuffer`] instead of
//!   panicking
//! - [`Writer`] - Writes big-endian data to an auto-growing buffer and can
//!   patch previously written words by logical offset
//!
//! # Example
//!
//! ```
//! use blobmsg_buffers::{Reader, Writer};
//!
//! // Write some data
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u16(0x0203);
//! writer.utf8("hello");
//! let data = writer.flush();
//!
//! // Read it back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8(), Ok(0x01));
//! assert_eq!(reader.u16(), Ok(0x0203));
//! assert_eq!(reader.utf8(5), Ok("hello"));
//! assert!(reader.u8().is_err());
//! ```

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Rounds `n` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline]
pub const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer,
    /// Invalid UTF-8 sequence.
    InvalidUtf8,
    /// Buffer overflow during write.
    Overflow,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer => write!(f, "end of buffer"),
            BufferError::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            BufferError::Overflow => write!(f, "buffer overflow"),
        }
    }
}

impl std::error::Error for BufferError {}
