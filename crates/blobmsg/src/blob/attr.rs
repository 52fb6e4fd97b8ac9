//! Borrowed view of one attribute.

use super::header::{AttrHeader, HEADER_SIZE};
use super::iter::AttrIter;
use crate::error::{BlobError, Result};

/// One attribute: its decoded header plus the bytes it covers.
///
/// `raw` is exactly `header.len` bytes long and starts with the header word.
/// Every `Attr` handed out by this crate has been checked to lie inside the
/// buffer it came from, so accessors only ever slice within `raw`.
#[derive(Debug, Clone, Copy)]
pub struct Attr<'a> {
    header: AttrHeader,
    raw: &'a [u8],
}

impl<'a> Attr<'a> {
    /// Reads the attribute at the start of `buf`.
    ///
    /// The declared length must fit in `buf`; trailing padding may be absent.
    pub fn from_bytes(buf: &'a [u8]) -> Result<Self> {
        let header = AttrHeader::read(buf, 0)?;
        header.payload_len()?;
        let raw = buf.get(..header.len()).ok_or(BlobError::Truncated)?;
        Ok(Self { header, raw })
    }

    /// Pairs a header with bytes already known to match it.
    pub(crate) fn from_parts(header: AttrHeader, raw: &'a [u8]) -> Self {
        debug_assert_eq!(raw.len(), header.len());
        Self { header, raw }
    }

    /// The decoded header.
    pub fn header(&self) -> AttrHeader {
        self.header
    }

    /// Raw 7-bit type id.
    pub fn kind(&self) -> u8 {
        self.header.kind
    }

    /// The reserved flag bit as read.
    pub fn is_extended(&self) -> bool {
        self.header.extended
    }

    /// Declared length, header included.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// `true` when the attribute carries no payload.
    pub fn is_empty(&self) -> bool {
        self.raw.len() <= HEADER_SIZE
    }

    /// Declared length rounded up to the alignment unit.
    pub fn padded_len(&self) -> usize {
        self.header.padded_len()
    }

    /// The whole attribute, header included.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Everything after the header.
    pub fn payload(&self) -> &'a [u8] {
        self.raw.get(HEADER_SIZE..).unwrap_or_default()
    }

    /// Iterates the payload as a sequence of raw attributes.
    pub fn iter(&self) -> AttrIter<'a> {
        AttrIter::new(self.payload())
    }
}

impl PartialEq for Attr<'_> {
    fn eq(&self, other: &Self) -> bool {
        attr_equal(self, other)
    }
}

impl Eq for Attr<'_> {}

/// Two attributes are equal when they have the same declared length and
/// identical bytes, header included.
pub fn attr_equal(a: &Attr<'_>, b: &Attr<'_>) -> bool {
    a.len() == b.len() && a.raw == b.raw
}
