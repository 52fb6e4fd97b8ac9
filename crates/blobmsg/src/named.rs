//! Named attributes: the typed layer on top of raw framing.
//!
//! A named attribute's payload is
//!
//! ```text
//! +----------+-----------------+---------+-------------+
//! | name_len | name bytes, NUL | padding | value bytes |
//! |  u16 BE  |  name_len bytes |  to 4   |             |
//! +----------+-----------------+---------+-------------+
//! ```
//!
//! `name_len` counts the terminating NUL. A `name_len` of zero is read as an
//! empty name with no bytes at all.

use blobmsg_buffers::Reader;

use crate::blob::{iterate, pad4, Attr, AttrIter};
use crate::error::{BlobError, Result};
use crate::BlobmsgType;

/// Size of the name length prefix.
pub const NAME_LEN_SIZE: usize = 2;
/// Deepest container nesting accepted by validation and the builder.
pub const MAX_DEPTH: usize = 128;

/// Bytes taken by the name length, the name and its padding.
pub const fn name_header_len(name_len: usize) -> usize {
    pad4(NAME_LEN_SIZE + name_len)
}

/// A decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Unspec,
    /// Container payload, ready for [`iterate`] or [`crate::parse_array`].
    Array(&'a [u8]),
    /// Container payload, ready for [`iterate`] or [`crate::parse`].
    Table(&'a [u8]),
    String(&'a str),
    Int64(u64),
    Int32(u32),
    Int16(u16),
    Int8(u8),
    Double(f64),
}

struct Split<'a> {
    name: &'a [u8],
    data: &'a [u8],
}

fn split<'a>(attr: &Attr<'a>) -> Result<Split<'a>> {
    let payload = attr.payload();
    let mut reader = Reader::new(payload);
    let name_len = reader
        .u16()
        .map_err(|_| BlobError::Corrupt("name length missing"))? as usize;
    let hdr_len = name_header_len(name_len);
    if hdr_len > payload.len() {
        return Err(BlobError::Corrupt("name exceeds attribute"));
    }
    let name = &payload[NAME_LEN_SIZE..NAME_LEN_SIZE + name_len];
    let name = match name.split_last() {
        None => name,
        Some((0, rest)) => rest,
        Some(_) => return Err(BlobError::Corrupt("name not NUL-terminated")),
    };
    if name.contains(&0) {
        return Err(BlobError::Corrupt("name contains NUL"));
    }
    Ok(Split {
        name,
        data: &payload[hdr_len..],
    })
}

impl<'a> Attr<'a> {
    /// Type of the value, or `None` for ids past [`BlobmsgType::LAST`].
    pub fn blobmsg_type(&self) -> Option<BlobmsgType> {
        BlobmsgType::from_u8(self.kind())
    }

    /// The attribute name without its terminator.
    pub fn name(&self) -> Result<&'a str> {
        let bytes = split(self)?.name;
        std::str::from_utf8(bytes).map_err(|_| BlobError::InvalidUtf8)
    }

    /// Value bytes following the padded name.
    pub fn data(&self) -> Result<&'a [u8]> {
        Ok(split(self)?.data)
    }

    /// Length of the value bytes.
    pub fn data_len(&self) -> Result<usize> {
        Ok(self.data()?.len())
    }

    fn typed_data(&self, expected: BlobmsgType) -> Result<&'a [u8]> {
        if self.kind() != expected.as_u8() {
            return Err(BlobError::TypeMismatch {
                expected,
                actual: self.kind(),
            });
        }
        self.data()
    }

    fn fixed<const N: usize>(&self, expected: BlobmsgType) -> Result<[u8; N]> {
        let data = self.typed_data(expected)?;
        data.try_into()
            .map_err(|_| BlobError::Corrupt("scalar width does not match type"))
    }

    /// Reads an `Int8` value.
    pub fn as_u8(&self) -> Result<u8> {
        self.fixed::<1>(BlobmsgType::Int8).map(|b| b[0])
    }

    /// Reads an `Int8` value as a boolean; any non-zero byte is `true`.
    pub fn as_bool(&self) -> Result<bool> {
        self.as_u8().map(|v| v != 0)
    }

    /// Reads an `Int16` value.
    pub fn as_u16(&self) -> Result<u16> {
        self.fixed(BlobmsgType::Int16).map(u16::from_be_bytes)
    }

    /// Reads an `Int32` value.
    pub fn as_u32(&self) -> Result<u32> {
        self.fixed(BlobmsgType::Int32).map(u32::from_be_bytes)
    }

    /// Reads an `Int64` value.
    pub fn as_u64(&self) -> Result<u64> {
        self.fixed(BlobmsgType::Int64).map(u64::from_be_bytes)
    }

    /// Reads an `Int8` value as two's complement.
    pub fn as_i8(&self) -> Result<i8> {
        self.as_u8().map(|v| v as i8)
    }

    /// Reads an `Int16` value as two's complement.
    pub fn as_i16(&self) -> Result<i16> {
        self.as_u16().map(|v| v as i16)
    }

    /// Reads an `Int32` value as two's complement.
    pub fn as_i32(&self) -> Result<i32> {
        self.as_u32().map(|v| v as i32)
    }

    /// Reads an `Int64` value as two's complement.
    pub fn as_i64(&self) -> Result<i64> {
        self.as_u64().map(|v| v as i64)
    }

    /// Reads a `Double` value.
    pub fn as_f64(&self) -> Result<f64> {
        self.fixed(BlobmsgType::Double).map(f64::from_be_bytes)
    }

    /// String bytes without the terminator.
    pub fn as_str_bytes(&self) -> Result<&'a [u8]> {
        match self.typed_data(BlobmsgType::String)?.split_last() {
            Some((0, rest)) => Ok(rest),
            _ => Err(BlobError::Corrupt("string not NUL-terminated")),
        }
    }

    /// Reads a `String` value as UTF-8.
    pub fn as_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.as_str_bytes()?).map_err(|_| BlobError::InvalidUtf8)
    }

    /// Payload of a table, the input [`crate::parse`] expects.
    pub fn as_table(&self) -> Result<&'a [u8]> {
        self.typed_data(BlobmsgType::Table)
    }

    /// Payload of an array, the input [`crate::parse_array`] expects.
    pub fn as_array(&self) -> Result<&'a [u8]> {
        self.typed_data(BlobmsgType::Array)
    }

    /// Iterates the children of a table or array.
    pub fn children(&self) -> Result<AttrIter<'a>> {
        match self.blobmsg_type() {
            Some(ty) if ty.is_container() => Ok(iterate(self.data()?)),
            _ => Err(BlobError::TypeMismatch {
                expected: BlobmsgType::Table,
                actual: self.kind(),
            }),
        }
    }

    /// Decodes the value according to its type tag.
    pub fn value(&self) -> Result<Value<'a>> {
        let ty = self
            .blobmsg_type()
            .ok_or(BlobError::Corrupt("unknown type id"))?;
        Ok(match ty {
            BlobmsgType::Unspec => Value::Unspec,
            BlobmsgType::Array => Value::Array(self.data()?),
            BlobmsgType::Table => Value::Table(self.data()?),
            BlobmsgType::String => Value::String(self.as_str()?),
            BlobmsgType::Int64 => Value::Int64(self.as_u64()?),
            BlobmsgType::Int32 => Value::Int32(self.as_u32()?),
            BlobmsgType::Int16 => Value::Int16(self.as_u16()?),
            BlobmsgType::Int8 => Value::Int8(self.as_u8()?),
            BlobmsgType::Double => Value::Double(self.as_f64()?),
        })
    }

    /// Validates this attribute and everything nested in it.
    ///
    /// `named` requires a non-empty name, as table members have.
    pub fn check(&self, named: bool) -> Result<()> {
        self.check_at(named, 0)
    }

    fn check_at(&self, named: bool, depth: usize) -> Result<()> {
        let parts = split(self)?;
        if named && parts.name.is_empty() {
            return Err(BlobError::Corrupt("table member without a name"));
        }
        std::str::from_utf8(parts.name).map_err(|_| BlobError::InvalidUtf8)?;
        let ty = self
            .blobmsg_type()
            .ok_or(BlobError::Corrupt("unknown type id"))?;
        if let Some(width) = ty.fixed_width() {
            if parts.data.len() != width {
                return Err(BlobError::Corrupt("scalar width does not match type"));
            }
            return Ok(());
        }
        match ty {
            BlobmsgType::String => match parts.data.last() {
                Some(0) => Ok(()),
                _ => Err(BlobError::Corrupt("string not NUL-terminated")),
            },
            BlobmsgType::Table | BlobmsgType::Array => {
                if depth >= MAX_DEPTH {
                    return Err(BlobError::Corrupt("nesting too deep"));
                }
                let named = ty == BlobmsgType::Table;
                for child in iterate(parts.data) {
                    child?.check_at(named, depth + 1)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Validates a sequence of attributes, such as a root or container payload.
///
/// With `kind` set, every element must carry that type. `named` is `true`
/// for table members and `false` for array elements. Returns the number of
/// elements.
pub fn check_attr_list(data: &[u8], kind: Option<BlobmsgType>, named: bool) -> Result<usize> {
    let mut count = 0;
    for attr in iterate(data) {
        let attr = attr?;
        if let Some(kind) = kind {
            if attr.kind() != kind.as_u8() {
                return Err(BlobError::TypeMismatch {
                    expected: kind,
                    actual: attr.kind(),
                });
            }
        }
        attr.check(named)?;
        count += 1;
    }
    Ok(count)
}
