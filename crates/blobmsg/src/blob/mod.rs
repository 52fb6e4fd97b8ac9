//! Raw attribute framing: headers, padding and bounds-checked iteration.
//!
//! Nothing here knows about names or value types; see [`crate::types`] and
//! the accessors in [`crate::named`] for that layer.

mod attr;
mod header;
mod iter;

pub use attr::{attr_equal, Attr};
pub use header::{encode_header, pad4, AttrHeader, ATTR_ALIGN, HEADER_SIZE, MAX_KIND, MAX_LEN};
pub use iter::{iterate, AttrIter};
