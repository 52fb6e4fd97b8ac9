//! Policy-driven extraction of fields from a table or array payload.

use std::ops::Index;

use crate::blob::{iterate, Attr};
use crate::error::BlobError;
use crate::BlobmsgType;

/// One expected field: its name and type.
///
/// A kind of [`BlobmsgType::Unspec`] accepts a member of any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy<'p> {
    pub name: &'p str,
    pub kind: BlobmsgType,
}

impl<'p> Policy<'p> {
    /// Matches `name` when its type is `kind`.
    pub const fn new(name: &'p str, kind: BlobmsgType) -> Self {
        Self { name, kind }
    }

    /// Matches `name` whatever its type.
    pub const fn any(name: &'p str) -> Self {
        Self::new(name, BlobmsgType::Unspec)
    }

    fn accepts(&self, kind: u8) -> bool {
        self.kind == BlobmsgType::Unspec || self.kind.as_u8() == kind
    }
}

/// Result of a parse: one slot per policy entry.
///
/// Every bound attribute lies entirely inside the parsed range and passed
/// [`Attr::check`]. When the walk stopped early, [`error`](Parsed::error)
/// says why and the slots hold what was found before that point.
#[derive(Debug, Clone)]
pub struct Parsed<'a> {
    slots: Vec<Option<Attr<'a>>>,
    error: Option<BlobError>,
}

impl<'a> Parsed<'a> {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            error: None,
        }
    }

    /// The attribute bound to policy entry `index`.
    pub fn get(&self, index: usize) -> Option<Attr<'a>> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of policy entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` for an empty policy.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of bound entries.
    pub fn found(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Slots in policy order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Attr<'a>>> + '_ {
        self.slots.iter().copied()
    }

    /// `true` when the walk was not cut short by truncated or corrupt input.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Why the walk stopped early, if it did.
    pub fn error(&self) -> Option<&BlobError> {
        self.error.as_ref()
    }

    /// Converts an early stop into an error, for callers that want all or
    /// nothing.
    pub fn into_result(self) -> Result<Vec<Option<Attr<'a>>>, BlobError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.slots),
        }
    }
}

impl<'a> Index<usize> for Parsed<'a> {
    type Output = Option<Attr<'a>>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.slots[index]
    }
}

/// Binds table members in `data` to `policy` entries by name and type.
///
/// Names compare case-sensitively. The first occurrence of a name with the
/// expected type wins; later duplicates, unknown names and type mismatches
/// are skipped. Truncated or corrupt framing, or a matching member that fails
/// [`Attr::check`], ends the walk with [`Parsed::error`] set, keeping earlier
/// bindings.
///
/// # Example
///
/// ```
/// use blobmsg::{parse, BlobBuf, BlobmsgType, Policy};
///
/// const POLICY: &[Policy<'static>] = &[
///     Policy::new("message", BlobmsgType::String),
///     Policy::new("count", BlobmsgType::Int32),
/// ];
///
/// let mut buf = BlobBuf::new();
/// buf.add_string(Some("message"), "hi").unwrap();
/// let blob = buf.finish().unwrap();
///
/// let tb = parse(POLICY, blob.data());
/// assert_eq!(tb[0].unwrap().as_str(), Ok("hi"));
/// assert!(tb[1].is_none());
/// assert!(tb.is_complete());
/// ```
pub fn parse<'a>(policy: &[Policy<'_>], data: &'a [u8]) -> Parsed<'a> {
    let mut parsed = Parsed::new(policy.len());
    let mut remaining = policy.len();
    let mut iter = iterate(data);
    while remaining > 0 {
        let attr = match iter.next() {
            None => break,
            Some(Ok(attr)) => attr,
            Some(Err(err)) => {
                tracing::debug!(
                    offset = iter.position(),
                    found = parsed.found(),
                    error = %err,
                    "table walk stopped early"
                );
                parsed.error = Some(err);
                break;
            }
        };
        let Ok(name) = attr.name() else {
            tracing::debug!(offset = iter.position(), "skipping member with malformed name");
            continue;
        };
        let mut checked = false;
        let mut invalid = None;
        for (slot, entry) in parsed.slots.iter_mut().zip(policy) {
            if slot.is_some() || !entry.accepts(attr.kind()) || entry.name != name {
                continue;
            }
            if !checked {
                if let Err(err) = attr.check(true) {
                    invalid = Some(err);
                    break;
                }
                checked = true;
            }
            *slot = Some(attr);
            remaining -= 1;
        }
        if let Some(err) = invalid {
            tracing::debug!(
                name,
                offset = iter.position(),
                found = parsed.found(),
                error = %err,
                "invalid member stopped the table walk"
            );
            parsed.error = Some(err);
            break;
        }
    }
    parsed
}

/// Binds array elements in `data` to `policy` entries by position.
///
/// Element `i` binds entry `i` when the types agree; names are ignored.
/// Truncated framing or a matching element that fails [`Attr::check`] ends
/// the walk, as for [`parse`].
pub fn parse_array<'a>(policy: &[Policy<'_>], data: &'a [u8]) -> Parsed<'a> {
    let mut parsed = Parsed::new(policy.len());
    let mut iter = iterate(data);
    for (slot, entry) in parsed.slots.iter_mut().zip(policy) {
        let attr = match iter.next() {
            None => break,
            Some(Ok(attr)) => attr,
            Some(Err(err)) => {
                tracing::debug!(offset = iter.position(), error = %err, "array walk stopped early");
                parsed.error = Some(err);
                break;
            }
        };
        if !entry.accepts(attr.kind()) {
            continue;
        }
        if let Err(err) = attr.check(false) {
            tracing::debug!(offset = iter.position(), error = %err, "invalid element stopped the array walk");
            parsed.error = Some(err);
            break;
        }
        *slot = Some(attr);
    }
    parsed
}
