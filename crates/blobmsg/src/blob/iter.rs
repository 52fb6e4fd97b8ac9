//! Forward iteration over packed attributes.

use blobmsg_buffers::Reader;

use super::attr::Attr;
use super::header::{AttrHeader, HEADER_SIZE};
use crate::error::{BlobError, Result};

/// Walks a byte range of back-to-back attributes.
///
/// Each step reads a header, checks that the declared length is at least a
/// header and that the padded length fits in what remains, then advances by
/// the padded length. The first failure is yielded once and ends the
/// iteration; nothing past the failing offset is ever touched.
#[derive(Debug, Clone)]
pub struct AttrIter<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> AttrIter<'a> {
    /// Iterates the attributes packed in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            done: false,
        }
    }

    /// Offset of the next attribute within the iterated range.
    pub fn position(&self) -> usize {
        self.reader.x
    }

    fn step(&mut self) -> Result<Attr<'a>> {
        let available = self.reader.size();
        let word = self.reader.subarray(HEADER_SIZE).map_err(|_| {
            tracing::trace!(offset = self.reader.x, available, "header truncated");
            BlobError::Truncated
        })?;
        let header = AttrHeader::decode([word[0], word[1], word[2], word[3]]);
        header.payload_len()?;
        let padded = header.padded_len();
        if padded > available {
            tracing::trace!(
                offset = self.reader.x,
                needed = padded,
                available,
                "attribute truncated"
            );
            return Err(BlobError::Truncated);
        }
        let bytes = self.reader.buf(padded)?;
        Ok(Attr::from_parts(header, &bytes[..header.len()]))
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Result<Attr<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }
        let item = self.step();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for AttrIter<'_> {}

/// Starts a fresh iteration over `data`.
pub fn iterate(data: &[u8]) -> AttrIter<'_> {
    AttrIter::new(data)
}
