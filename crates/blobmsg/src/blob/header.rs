//! Attribute header packing.
//!
//! A header is one big-endian 32-bit word:
//!
//! ```text
//!  31 30       24 23                      0
//! +--+-----------+------------------------+
//! |E |  type id  |        length          |
//! +--+-----------+------------------------+
//! ```
//!
//! `length` counts the header itself but not the trailing padding.

use blobmsg_buffers::{align_up, Reader};

use crate::error::{BlobError, Result};

/// Alignment unit for every attribute.
pub const ATTR_ALIGN: usize = 4;
/// Size of the packed header word.
pub const HEADER_SIZE: usize = 4;
/// Largest length the 24-bit field can carry.
pub const MAX_LEN: u32 = 0x00ff_ffff;
/// Largest type id the 7-bit field can carry.
pub const MAX_KIND: u8 = 0x7f;

const EXTENDED_BIT: u32 = 0x8000_0000;
const ID_MASK: u32 = 0x7f00_0000;
const ID_SHIFT: u32 = 24;
const LEN_MASK: u32 = 0x00ff_ffff;

/// Rounds `n` up to the attribute alignment.
#[inline]
pub const fn pad4(n: usize) -> usize {
    align_up(n, ATTR_ALIGN)
}

/// Decoded attribute header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrHeader {
    /// Reserved flag. Decoded and preserved, never set by the builder.
    pub extended: bool,
    pub kind: u8,
    /// Declared length, header included, padding excluded.
    pub len: u32,
}

impl AttrHeader {
    /// Header with the reserved flag cleared.
    pub const fn new(kind: u8, len: u32) -> Self {
        Self {
            extended: false,
            kind,
            len,
        }
    }

    /// Packs the header into its wire word.
    pub fn to_word(&self) -> Result<u32> {
        if self.kind > MAX_KIND {
            return Err(BlobError::InvalidValue("type id exceeds 7 bits"));
        }
        if self.len > MAX_LEN {
            return Err(BlobError::InvalidValue("length exceeds 24 bits"));
        }
        let mut word = ((self.kind as u32) << ID_SHIFT) | self.len;
        if self.extended {
            word |= EXTENDED_BIT;
        }
        Ok(word)
    }

    /// Unpacks a wire word; every bit pattern decodes.
    pub fn from_word(word: u32) -> Self {
        Self {
            extended: word & EXTENDED_BIT != 0,
            kind: ((word & ID_MASK) >> ID_SHIFT) as u8,
            len: word & LEN_MASK,
        }
    }

    /// Packs the header into its big-endian bytes.
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        self.to_word().map(u32::to_be_bytes)
    }

    /// Unpacks big-endian header bytes.
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        Self::from_word(u32::from_be_bytes(bytes))
    }

    /// Reads the header at `offset`, failing with [`BlobError::Truncated`]
    /// when fewer than [`HEADER_SIZE`] bytes remain.
    pub fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let mut reader = Reader::from_slice(buf, offset, buf.len());
        Ok(Self::from_word(reader.u32()?))
    }

    /// Declared length as `usize`.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Declared length rounded up to the alignment unit.
    pub fn padded_len(&self) -> usize {
        pad4(self.len())
    }

    /// Bytes after the header, or [`BlobError::Corrupt`] when the declared
    /// length cannot even hold the header.
    pub fn payload_len(&self) -> Result<usize> {
        self.len()
            .checked_sub(HEADER_SIZE)
            .ok_or(BlobError::Corrupt("declared length shorter than header"))
    }
}

/// Encodes a header for `kind` and `len`.
pub fn encode_header(kind: u8, len: u32) -> Result<[u8; HEADER_SIZE]> {
    AttrHeader::new(kind, len).encode()
}
