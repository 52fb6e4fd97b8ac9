//! Rendering attribute trees as JSON text.

use std::fmt::{self, Write as _};

use serde_json::{Map, Number, Value};

use crate::blob::{iterate, Attr};
use crate::named::MAX_DEPTH;
use crate::{Blob, BlobmsgType};

/// Indentation unit for pretty output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Tabs,
    Spaces(usize),
}

/// JSON rendering options.
///
/// The default is compact output, unsigned integers and six fractional
/// digits for doubles. [`with_shortest_floats`](JsonFormat::with_shortest_floats)
/// switches doubles to the shortest text that parses back to the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFormat {
    pub pretty: bool,
    pub indent: Indent,
    /// Render integers as two's complement signed values.
    pub signed_integers: bool,
    /// Fixed fractional digits for doubles, or `None` for the shortest
    /// round-trip form.
    pub float_precision: Option<usize>,
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: Indent::Tabs,
            signed_integers: false,
            float_precision: Some(6),
        }
    }
}

impl JsonFormat {
    /// Single-line output.
    pub fn compact() -> Self {
        Self::default()
    }

    /// One member per line, tab indented.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    /// Sets the indentation unit for pretty output.
    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    /// Renders integers as signed values.
    pub fn with_signed_integers(mut self, signed: bool) -> Self {
        self.signed_integers = signed;
        self
    }

    /// Renders doubles with exactly `digits` fractional digits.
    pub fn with_float_precision(mut self, digits: usize) -> Self {
        self.float_precision = Some(digits);
        self
    }

    /// Renders doubles losslessly, e.g. `1e-7` and `0.1234567891`.
    pub fn with_shortest_floats(mut self) -> Self {
        self.float_precision = None;
        self
    }

    /// Renders a root attribute: its payload as an object, or as an array
    /// when the root kind is [`BlobmsgType::Array`].
    pub fn format_root(&self, root: &Attr<'_>) -> String {
        let mut out = String::new();
        let is_table = root.kind() != BlobmsgType::Array.as_u8();
        self.write_container(&mut out, root.payload(), is_table, 0);
        out
    }

    /// Renders the value of one named attribute.
    ///
    /// `None` for unspec and unknown types, which containers leave out too.
    pub fn format_value(&self, attr: &Attr<'_>) -> Option<String> {
        if !renders(attr) {
            return None;
        }
        let mut out = String::new();
        self.write_value(&mut out, attr, 0);
        Some(out)
    }

    /// Renders a table payload, such as one returned by [`Attr::as_table`].
    pub fn format_table(&self, data: &[u8]) -> String {
        let mut out = String::new();
        self.write_container(&mut out, data, true, 0);
        out
    }

    /// Renders an array payload, such as one returned by [`Attr::as_array`].
    pub fn format_array(&self, data: &[u8]) -> String {
        let mut out = String::new();
        self.write_container(&mut out, data, false, 0);
        out
    }

    fn newline(&self, out: &mut String, depth: usize) {
        if !self.pretty {
            return;
        }
        out.push('\n');
        match self.indent {
            Indent::Tabs => out.extend(std::iter::repeat('\t').take(depth)),
            Indent::Spaces(n) => out.extend(std::iter::repeat(' ').take(depth * n)),
        }
    }

    fn write_container(&self, out: &mut String, data: &[u8], is_table: bool, depth: usize) {
        let (open, close) = if is_table { ('{', '}') } else { ('[', ']') };
        out.push(open);
        if depth >= MAX_DEPTH {
            out.push(close);
            return;
        }
        let mut first = true;
        for attr in iterate(data).map_while(Result::ok) {
            if !renders(&attr) {
                continue;
            }
            let key = if is_table {
                match attr.name() {
                    Ok(name) => Some(name),
                    Err(_) => continue,
                }
            } else {
                None
            };
            if !first {
                out.push(',');
            }
            first = false;
            self.newline(out, depth + 1);
            if let Some(key) = key {
                write_string(out, key);
                out.push(':');
                if self.pretty {
                    out.push(' ');
                }
            }
            self.write_value(out, &attr, depth + 1);
        }
        if !first {
            self.newline(out, depth);
        }
        out.push(close);
    }

    /// Writes one value. Anything that cannot be decoded becomes `null`.
    fn write_value(&self, out: &mut String, attr: &Attr<'_>, depth: usize) {
        let (Some(ty), Ok(data)) = (attr.blobmsg_type(), attr.data()) else {
            out.push_str("null");
            return;
        };
        let signed = self.signed_integers;
        let written = match ty {
            BlobmsgType::Unspec => Err(fmt::Error),
            BlobmsgType::Table => {
                self.write_container(out, data, true, depth);
                Ok(())
            }
            BlobmsgType::Array => {
                self.write_container(out, data, false, depth);
                Ok(())
            }
            BlobmsgType::String => {
                let bytes = data.strip_suffix(&[0u8]).unwrap_or(data);
                write_string(out, &String::from_utf8_lossy(bytes));
                Ok(())
            }
            BlobmsgType::Int8 => match attr.as_u8() {
                Ok(v) if signed => write!(out, "{}", v as i8),
                Ok(v) => write!(out, "{v}"),
                Err(_) => Err(fmt::Error),
            },
            BlobmsgType::Int16 => match attr.as_u16() {
                Ok(v) if signed => write!(out, "{}", v as i16),
                Ok(v) => write!(out, "{v}"),
                Err(_) => Err(fmt::Error),
            },
            BlobmsgType::Int32 => match attr.as_u32() {
                Ok(v) if signed => write!(out, "{}", v as i32),
                Ok(v) => write!(out, "{v}"),
                Err(_) => Err(fmt::Error),
            },
            BlobmsgType::Int64 => match attr.as_u64() {
                Ok(v) if signed => write!(out, "{}", v as i64),
                Ok(v) => write!(out, "{v}"),
                Err(_) => Err(fmt::Error),
            },
            BlobmsgType::Double => match (attr.as_f64(), self.float_precision) {
                (Ok(v), Some(digits)) if v.is_finite() => write!(out, "{v:.digits$}"),
                (Ok(v), None) => match Number::from_f64(v) {
                    Some(n) => write!(out, "{n}"),
                    None => Err(fmt::Error),
                },
                _ => Err(fmt::Error),
            },
        };
        if written.is_err() {
            out.push_str("null");
        }
    }
}

/// Only known, non-`Unspec` types appear in the output.
fn renders(attr: &Attr<'_>) -> bool {
    matches!(attr.blobmsg_type(), Some(ty) if ty != BlobmsgType::Unspec)
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

/// Renders a finished tree.
pub fn format_json(blob: &Blob, pretty: bool) -> String {
    let format = if pretty {
        JsonFormat::pretty()
    } else {
        JsonFormat::compact()
    };
    format.format_root(&blob.root())
}

/// Renders one named attribute's value; `None` for unspec or unknown types.
pub fn format_json_value(attr: &Attr<'_>, pretty: bool) -> Option<String> {
    let format = if pretty {
        JsonFormat::pretty()
    } else {
        JsonFormat::compact()
    };
    format.format_value(attr)
}

/// Converts a root attribute into a [`serde_json::Value`], keeping member
/// order.
pub fn to_json_value(root: &Attr<'_>) -> Value {
    let is_table = root.kind() != BlobmsgType::Array.as_u8();
    container_to_json(root.payload(), is_table, 0)
}

/// Converts one named attribute's value; `None` for unspec or unknown types.
pub fn value_to_json(attr: &Attr<'_>) -> Option<Value> {
    attr_to_json(attr, 0)
}

fn container_to_json(data: &[u8], is_table: bool, depth: usize) -> Value {
    let members = iterate(data).map_while(Result::ok);
    if depth >= MAX_DEPTH {
        return if is_table {
            Value::Object(Map::new())
        } else {
            Value::Array(Vec::new())
        };
    }
    if is_table {
        let mut map = Map::new();
        for attr in members {
            let (Ok(name), Some(value)) = (attr.name(), attr_to_json(&attr, depth + 1)) else {
                continue;
            };
            map.insert(name.to_owned(), value);
        }
        Value::Object(map)
    } else {
        Value::Array(
            members
                .filter_map(|attr| attr_to_json(&attr, depth + 1))
                .collect(),
        )
    }
}

fn attr_to_json(attr: &Attr<'_>, depth: usize) -> Option<Value> {
    let ty = attr.blobmsg_type()?;
    Some(match ty {
        BlobmsgType::Unspec => return None,
        BlobmsgType::Table => container_to_json(attr.data().ok()?, true, depth),
        BlobmsgType::Array => container_to_json(attr.data().ok()?, false, depth),
        BlobmsgType::String => {
            Value::String(String::from_utf8_lossy(attr.as_str_bytes().ok()?).into_owned())
        }
        BlobmsgType::Int8 => Value::from(attr.as_u8().ok()?),
        BlobmsgType::Int16 => Value::from(attr.as_u16().ok()?),
        BlobmsgType::Int32 => Value::from(attr.as_u32().ok()?),
        BlobmsgType::Int64 => Value::from(attr.as_u64().ok()?),
        BlobmsgType::Double => Number::from_f64(attr.as_f64().ok()?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    })
}
