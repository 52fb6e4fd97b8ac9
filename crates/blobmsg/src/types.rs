//! The closed set of blobmsg value types.

use std::fmt;

/// Type tag of a named attribute.
///
/// The discriminants are the on-wire 7-bit type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlobmsgType {
    Unspec = 0,
    Array = 1,
    Table = 2,
    String = 3,
    Int64 = 4,
    Int32 = 5,
    Int16 = 6,
    Int8 = 7,
    Double = 8,
}

impl BlobmsgType {
    /// Highest valid type id.
    pub const LAST: BlobmsgType = BlobmsgType::Double;
    /// Booleans travel as `Int8` holding 0 or 1.
    pub const BOOL: BlobmsgType = BlobmsgType::Int8;

    pub const ALL: [BlobmsgType; 9] = [
        BlobmsgType::Unspec,
        BlobmsgType::Array,
        BlobmsgType::Table,
        BlobmsgType::String,
        BlobmsgType::Int64,
        BlobmsgType::Int32,
        BlobmsgType::Int16,
        BlobmsgType::Int8,
        BlobmsgType::Double,
    ];

    /// Type for a wire id, `None` past [`LAST`](Self::LAST).
    pub const fn from_u8(id: u8) -> Option<Self> {
        Some(match id {
            0 => BlobmsgType::Unspec,
            1 => BlobmsgType::Array,
            2 => BlobmsgType::Table,
            3 => BlobmsgType::String,
            4 => BlobmsgType::Int64,
            5 => BlobmsgType::Int32,
            6 => BlobmsgType::Int16,
            7 => BlobmsgType::Int8,
            8 => BlobmsgType::Double,
            _ => return None,
        })
    }

    /// The wire id.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exact payload width for fixed-size scalars, `None` for everything else.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            BlobmsgType::Int64 | BlobmsgType::Double => Some(8),
            BlobmsgType::Int32 => Some(4),
            BlobmsgType::Int16 => Some(2),
            BlobmsgType::Int8 => Some(1),
            BlobmsgType::Unspec
            | BlobmsgType::Array
            | BlobmsgType::Table
            | BlobmsgType::String => None,
        }
    }

    /// `true` for tables and arrays.
    pub const fn is_container(self) -> bool {
        matches!(self, BlobmsgType::Array | BlobmsgType::Table)
    }

    /// Lowercase type name.
    pub const fn name(self) -> &'static str {
        match self {
            BlobmsgType::Unspec => "unspec",
            BlobmsgType::Array => "array",
            BlobmsgType::Table => "table",
            BlobmsgType::String => "string",
            BlobmsgType::Int64 => "int64",
            BlobmsgType::Int32 => "int32",
            BlobmsgType::Int16 => "int16",
            BlobmsgType::Int8 => "int8",
            BlobmsgType::Double => "double",
        }
    }
}

impl fmt::Display for BlobmsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
