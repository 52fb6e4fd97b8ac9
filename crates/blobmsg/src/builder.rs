//! Incremental construction of attribute trees.

use blobmsg_buffers::Writer;

use crate::blob::{pad4, Attr, AttrHeader, HEADER_SIZE, MAX_LEN};
use crate::error::{BlobError, Result};
use crate::named::{name_header_len, MAX_DEPTH};
use crate::BlobmsgType;

/// Handle for an open table or array.
///
/// It records the logical offset of the container header, never an address,
/// so it stays valid while the buffer grows. Pass it back to
/// [`BlobBuf::close`] in LIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an open scope has to be closed"]
pub struct Scope {
    offset: usize,
    depth: usize,
}

impl Scope {
    /// Offset of the container header within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenScope {
    offset: usize,
    kind: BlobmsgType,
}

/// Builder state to return to with [`BlobBuf::rollback`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    len: usize,
    depth: usize,
}

/// Builder for one attribute tree.
///
/// The buffer starts with a placeholder root header whose length is filled in
/// by [`finish`](BlobBuf::finish). Values are appended to the innermost open
/// scope, or to the root when none is open.
///
/// # Example
///
/// ```
/// use blobmsg::{BlobBuf, JsonFormat};
///
/// let mut buf = BlobBuf::new();
/// buf.add_string(Some("message"), "hi").unwrap();
/// let list = buf.open_array(Some("list")).unwrap();
/// buf.add_u32(None, 1).unwrap();
/// buf.add_u32(None, 2).unwrap();
/// buf.close(list).unwrap();
/// let blob = buf.finish().unwrap();
///
/// assert_eq!(
///     JsonFormat::compact().format_root(&blob.root()),
///     r#"{"message":"hi","list":[1,2]}"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BlobBuf {
    writer: Writer,
    scopes: Vec<OpenScope>,
    root: BlobmsgType,
}

impl Default for BlobBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobBuf {
    /// Creates an empty builder with a table root.
    pub fn new() -> Self {
        Self::with_capacity(Writer::DEFAULT_CAPACITY)
    }

    /// Creates an empty builder whose buffer holds `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Self {
            writer: Writer::with_capacity(capacity.max(HEADER_SIZE)),
            scopes: Vec::new(),
            root: BlobmsgType::Table,
        };
        buf.reset();
        buf
    }

    /// Builder whose root container is `root` instead of a table.
    pub fn with_root(root: BlobmsgType) -> Result<Self> {
        if !root.is_container() {
            return Err(BlobError::InvalidValue("root must be a table or array"));
        }
        let mut buf = Self::new();
        buf.root = root;
        Ok(buf)
    }

    /// Drops everything appended so far, keeping the allocation.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.scopes.clear();
        self.writer.u32(0);
    }

    /// Bytes written so far, root header included.
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    /// `true` while nothing has been appended below the root.
    pub fn is_empty(&self) -> bool {
        self.writer.len() == HEADER_SIZE
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            len: self.writer.len(),
            depth: self.scopes.len(),
        }
    }

    /// Drops everything appended and every scope opened since `mark`.
    pub(crate) fn rollback(&mut self, mark: Mark) {
        self.writer.truncate(mark.len);
        self.scopes.truncate(mark.depth);
    }

    fn ensure_fits(&self, total: usize) -> Result<()> {
        let end = self
            .writer
            .len()
            .checked_add(pad4(total))
            .ok_or(BlobError::InvalidValue("attribute too long"))?;
        if end > MAX_LEN as usize {
            return Err(BlobError::InvalidValue("attribute too long"));
        }
        Ok(())
    }

    /// Writes header and name; returns the header offset.
    fn begin(&mut self, kind: BlobmsgType, name: Option<&str>, value_len: usize) -> Result<usize> {
        let name = name.unwrap_or("").as_bytes();
        if name.contains(&0) {
            return Err(BlobError::InvalidValue("name contains NUL"));
        }
        let name_len = name.len() + 1;
        let name_len = u16::try_from(name_len)
            .map_err(|_| BlobError::InvalidValue("name longer than 65534 bytes"))?;
        let total = HEADER_SIZE + name_header_len(name_len as usize) + value_len;
        self.ensure_fits(total)?;
        let offset = self.writer.len();
        self.writer.buf(&AttrHeader::new(kind.as_u8(), total as u32).encode()?);
        self.writer.u16(name_len);
        self.writer.buf(name);
        self.writer.u8(0);
        self.writer.pad(4);
        Ok(offset)
    }

    /// Appends a named attribute whose value bytes are `data`.
    pub fn add_field(&mut self, kind: BlobmsgType, name: Option<&str>, data: &[u8]) -> Result<()> {
        if kind.is_container() {
            // Container payloads must hold attributes; accept only well-formed ones.
            crate::named::check_attr_list(data, None, kind == BlobmsgType::Table)
                .map_err(|_| BlobError::InvalidValue("container payload is not an attribute list"))?;
        }
        if let Some(width) = kind.fixed_width() {
            if data.len() != width {
                return Err(BlobError::InvalidValue("scalar width does not match type"));
            }
        }
        self.begin(kind, name, data.len())?;
        self.writer.buf(data);
        self.writer.pad(4);
        Ok(())
    }

    /// Appends a value-less attribute.
    pub fn add_unspec(&mut self, name: Option<&str>) -> Result<()> {
        self.add_field(BlobmsgType::Unspec, name, &[])
    }

    /// Appends an `Int8`.
    pub fn add_u8(&mut self, name: Option<&str>, val: u8) -> Result<()> {
        self.add_field(BlobmsgType::Int8, name, &[val])
    }

    /// Appends a boolean as an `Int8` holding 0 or 1.
    pub fn add_bool(&mut self, name: Option<&str>, val: bool) -> Result<()> {
        self.add_u8(name, val as u8)
    }

    /// Appends an `Int16`.
    pub fn add_u16(&mut self, name: Option<&str>, val: u16) -> Result<()> {
        self.add_field(BlobmsgType::Int16, name, &val.to_be_bytes())
    }

    /// Appends an `Int32`.
    pub fn add_u32(&mut self, name: Option<&str>, val: u32) -> Result<()> {
        self.add_field(BlobmsgType::Int32, name, &val.to_be_bytes())
    }

    /// Appends an `Int64`.
    pub fn add_u64(&mut self, name: Option<&str>, val: u64) -> Result<()> {
        self.add_field(BlobmsgType::Int64, name, &val.to_be_bytes())
    }

    /// Appends a `Double`.
    pub fn add_double(&mut self, name: Option<&str>, val: f64) -> Result<()> {
        self.add_field(BlobmsgType::Double, name, &val.to_be_bytes())
    }

    /// Appends a NUL-terminated string. Interior NUL bytes are rejected.
    pub fn add_string(&mut self, name: Option<&str>, val: &str) -> Result<()> {
        let bytes = val.as_bytes();
        if bytes.contains(&0) {
            return Err(BlobError::InvalidValue("string contains NUL"));
        }
        self.begin(BlobmsgType::String, name, bytes.len() + 1)?;
        self.writer.buf(bytes);
        self.writer.u8(0);
        self.writer.pad(4);
        Ok(())
    }

    /// Appends a copy of `attr`'s value, with its type, under a new name.
    pub fn add_blob(&mut self, name: Option<&str>, attr: &Attr<'_>) -> Result<()> {
        let kind = attr
            .blobmsg_type()
            .ok_or(BlobError::InvalidValue("unknown type id"))?;
        attr.check(false)
            .map_err(|_| BlobError::InvalidValue("source attribute is malformed"))?;
        let data = attr.data()?;
        self.begin(kind, name, data.len())?;
        self.writer.buf(data);
        self.writer.pad(4);
        Ok(())
    }

    fn open(&mut self, kind: BlobmsgType, name: Option<&str>) -> Result<Scope> {
        if self.scopes.len() >= MAX_DEPTH {
            return Err(BlobError::InvalidValue("nesting too deep"));
        }
        let offset = self.begin(kind, name, 0)?;
        self.scopes.push(OpenScope { offset, kind });
        tracing::trace!(offset, kind = %kind, depth = self.scopes.len(), "opened scope");
        Ok(Scope {
            offset,
            depth: self.scopes.len(),
        })
    }

    /// Opens a table; members added until the matching [`close`](Self::close) go inside it.
    pub fn open_table(&mut self, name: Option<&str>) -> Result<Scope> {
        self.open(BlobmsgType::Table, name)
    }

    /// Opens an array; elements added until the matching [`close`](Self::close) go inside it.
    pub fn open_array(&mut self, name: Option<&str>) -> Result<Scope> {
        self.open(BlobmsgType::Array, name)
    }

    /// Closes the innermost scope and patches its length.
    ///
    /// Fails with [`BlobError::ScopeMismatch`], leaving everything as it was,
    /// if `scope` is not the innermost open scope.
    pub fn close(&mut self, scope: Scope) -> Result<()> {
        let top = match self.scopes.last() {
            Some(top) if top.offset == scope.offset && self.scopes.len() == scope.depth => *top,
            _ => return Err(BlobError::ScopeMismatch),
        };
        let len = self.writer.len() - top.offset;
        let header = AttrHeader::new(top.kind.as_u8(), len as u32);
        self.writer.patch_u32(top.offset, header.to_word()?)?;
        self.scopes.pop();
        tracing::trace!(offset = top.offset, len, "closed scope");
        Ok(())
    }

    /// Completes the tree and hands the bytes over.
    ///
    /// Every opened scope must have been closed.
    pub fn finish(mut self) -> Result<Blob> {
        if !self.scopes.is_empty() {
            return Err(BlobError::ScopeMismatch);
        }
        let len = self.writer.len();
        let header = AttrHeader::new(self.root.as_u8(), len as u32);
        self.writer.patch_u32(0, header.to_word()?)?;
        Ok(Blob {
            header,
            buf: self.writer.flush(),
        })
    }
}

/// A finished attribute tree.
///
/// The buffer always starts with a root header whose declared length fits
/// the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    header: AttrHeader,
    buf: Vec<u8>,
}

impl Blob {
    /// Adopts bytes produced elsewhere, checking only the root header.
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self> {
        let header = Attr::from_bytes(&buf)?.header();
        Ok(Self { header, buf })
    }

    /// The root attribute covering the whole tree.
    pub fn root(&self) -> Attr<'_> {
        let len = self.header.len().min(self.buf.len());
        Attr::from_parts(self.header, &self.buf[..len])
    }

    /// The root payload: the top-level members.
    pub fn data(&self) -> &[u8] {
        self.root().payload()
    }

    /// Length of the whole buffer, root header included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when the root has no members.
    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// The whole encoded tree.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hands the encoded tree over.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_finishes_to_root_header() {
        let blob = BlobBuf::new().finish().unwrap();
        assert_eq!(blob.as_bytes(), &[0x02, 0x00, 0x00, 0x04]);
        assert!(blob.is_empty());
        assert!(blob.data().is_empty());
    }

    #[test]
    fn string_layout() {
        let mut buf = BlobBuf::new();
        buf.add_string(Some("test"), "12345678").unwrap();
        let blob = buf.finish().unwrap();
        #[rustfmt::skip]
        let expected = [
            0x02, 0x00, 0x00, 0x1c,             // root table, 28 bytes
            0x03, 0x00, 0x00, 0x15,             // string, 21 bytes
            0x00, 0x05, b't', b'e', b's', b't', 0x00, 0x00,
            b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', 0x00,
            0x00, 0x00, 0x00,                   // padding
        ];
        assert_eq!(blob.as_bytes(), &expected);
    }

    #[test]
    fn close_patches_container_length() {
        let mut buf = BlobBuf::new();
        let table = buf.open_table(Some("t")).unwrap();
        buf.add_u8(Some("a"), 1).unwrap();
        buf.close(table).unwrap();
        let blob = buf.finish().unwrap();
        let table = blob.root().iter().next().unwrap().unwrap();
        // header + name "t" padded to 4 + child (4 + 4 + 1 padded to 12)
        assert_eq!(table.len(), 4 + 4 + 12);
        assert_eq!(table.kind(), BlobmsgType::Table.as_u8());
    }

    #[test]
    fn close_out_of_order_is_rejected() {
        let mut buf = BlobBuf::new();
        let outer = buf.open_table(Some("outer")).unwrap();
        let inner = buf.open_array(Some("inner")).unwrap();
        let before = buf.writer.as_slice().to_vec();
        assert_eq!(buf.close(outer), Err(BlobError::ScopeMismatch));
        assert_eq!(buf.writer.as_slice(), &before[..]);
        assert_eq!(buf.depth(), 2);
        buf.close(inner).unwrap();
        buf.close(outer).unwrap();
        assert_eq!(buf.close(outer), Err(BlobError::ScopeMismatch));
        assert!(buf.finish().is_ok());
    }

    #[test]
    fn stale_handle_after_reopen_is_rejected() {
        let mut buf = BlobBuf::new();
        let first = buf.open_table(Some("a")).unwrap();
        buf.close(first).unwrap();
        let second = buf.open_table(Some("b")).unwrap();
        assert_eq!(buf.close(first), Err(BlobError::ScopeMismatch));
        buf.close(second).unwrap();
    }

    #[test]
    fn finish_with_open_scope_fails() {
        let mut buf = BlobBuf::new();
        let _open = buf.open_table(Some("t")).unwrap();
        assert_eq!(buf.finish(), Err(BlobError::ScopeMismatch));
    }

    #[test]
    fn invalid_values_leave_buffer_untouched() {
        let mut buf = BlobBuf::new();
        buf.add_u8(Some("ok"), 1).unwrap();
        let before = buf.len();
        assert!(matches!(
            buf.add_string(Some("s"), "a\0b"),
            Err(BlobError::InvalidValue(_))
        ));
        assert!(matches!(
            buf.add_u8(Some("bad\0name"), 1),
            Err(BlobError::InvalidValue(_))
        ));
        let long_name = "n".repeat(70_000);
        assert!(matches!(
            buf.add_u8(Some(long_name.as_str()), 1),
            Err(BlobError::InvalidValue(_))
        ));
        assert!(matches!(
            buf.add_field(BlobmsgType::Int32, Some("w"), &[1, 2]),
            Err(BlobError::InvalidValue(_))
        ));
        let huge = vec![b'x'; MAX_LEN as usize];
        assert!(matches!(
            buf.add_field(BlobmsgType::Unspec, Some("huge"), &huge),
            Err(BlobError::InvalidValue(_))
        ));
        assert_eq!(buf.len(), before);
    }

    #[test]
    fn nesting_is_bounded() {
        let mut buf = BlobBuf::new();
        let mut scopes = Vec::new();
        for _ in 0..MAX_DEPTH {
            scopes.push(buf.open_array(None).unwrap());
        }
        assert!(matches!(
            buf.open_table(Some("deep")),
            Err(BlobError::InvalidValue(_))
        ));
        while let Some(scope) = scopes.pop() {
            buf.close(scope).unwrap();
        }
        let blob = buf.finish().unwrap();
        let outer = blob.root().iter().next().unwrap().unwrap();
        assert!(outer.check(false).is_ok());
    }

    #[test]
    fn reset_reuses_builder() {
        let mut buf = BlobBuf::new();
        buf.add_u32(Some("a"), 1).unwrap();
        let _open = buf.open_table(Some("t")).unwrap();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.depth(), 0);
        buf.add_u32(Some("b"), 2).unwrap();
        let blob = buf.finish().unwrap();
        let attr = blob.root().iter().next().unwrap().unwrap();
        assert_eq!(attr.name(), Ok("b"));
        assert_eq!(attr.as_u32(), Ok(2));
    }

    #[test]
    fn array_root() {
        let mut buf = BlobBuf::with_root(BlobmsgType::Array).unwrap();
        buf.add_u8(None, 7).unwrap();
        let blob = buf.finish().unwrap();
        assert_eq!(blob.root().kind(), BlobmsgType::Array.as_u8());
        assert!(BlobBuf::with_root(BlobmsgType::String).is_err());
    }

    #[test]
    fn from_bytes_checks_root() {
        let mut buf = BlobBuf::new();
        buf.add_u8(Some("a"), 1).unwrap();
        let bytes = buf.finish().unwrap().into_bytes();
        let blob = Blob::from_bytes(bytes.clone()).unwrap();
        assert_eq!(blob.as_bytes(), &bytes[..]);
        assert_eq!(
            Blob::from_bytes(bytes[..bytes.len() - 1].to_vec()),
            Err(BlobError::Truncated)
        );
        assert_eq!(Blob::from_bytes(vec![0, 0]), Err(BlobError::Truncated));
    }
}
