//! Compact, self-describing binary attribute trees.
//!
//! Every attribute carries a 7-bit type tag and a 24-bit length in one
//! big-endian header word, followed by its payload and zero padding to a
//! 4-byte boundary. On top of that raw framing, named attributes add a
//! field name and a closed set of value types ([`BlobmsgType`]).
//!
//! # Overview
//!
//! - [`blob`] - raw framing: [`AttrHeader`], [`Attr`] views and the
//!   bounds-checked [`AttrIter`]
//! - [`BlobBuf`] - builds a tree with nested tables and arrays
//! - [`parse`] / [`parse_array`] - extract fields by [`Policy`]; never
//!   exposes an attribute that is not entirely inside the given bytes
//! - [`JsonFormat`] - renders a tree as JSON text, compact or indented
//!
//! # Example
//!
//! ```
//! use blobmsg::{format_json, parse, BlobBuf, BlobmsgType, Policy};
//!
//! let mut buf = BlobBuf::new();
//! buf.add_string(Some("message"), "Hello, world!").unwrap();
//! let data = buf.open_table(Some("testdata")).unwrap();
//! buf.add_u32(Some("hello"), 1).unwrap();
//! buf.close(data).unwrap();
//! let blob = buf.finish().unwrap();
//!
//! let tb = parse(
//!     &[
//!         Policy::new("message", BlobmsgType::String),
//!         Policy::new("testdata", BlobmsgType::Table),
//!     ],
//!     blob.data(),
//! );
//! assert_eq!(tb[0].unwrap().as_str(), Ok("Hello, world!"));
//! assert_eq!(
//!     format_json(&blob, false),
//!     r#"{"message":"Hello, world!","testdata":{"hello":1}}"#
//! );
//! ```

pub mod blob;
mod builder;
mod error;
pub mod json;
mod named;
mod parse;
mod types;

pub use blob::{attr_equal, iterate, pad4, Attr, AttrHeader, AttrIter};
pub use builder::{Blob, BlobBuf, Scope};
pub use error::{BlobError, Result};
pub use json::{
    add_json_str, add_json_value, format_json, format_json_value, to_json_value, value_to_json,
    Indent, JsonError, JsonFormat,
};
pub use named::{check_attr_list, name_header_len, Value, MAX_DEPTH, NAME_LEN_SIZE};
pub use parse::{parse, parse_array, Parsed, Policy};
pub use types::BlobmsgType;
