//! Importing JSON documents into a builder.

use serde_json::{Map, Number, Value};

use super::error::JsonError;
use crate::error::Result;
use crate::BlobBuf;

/// Parses `text` and appends the members of its top-level object to `buf`.
///
/// # Example
///
/// ```
/// use blobmsg::{add_json_str, format_json, BlobBuf};
///
/// let mut buf = BlobBuf::new();
/// add_json_str(&mut buf, r#"{"a": 1, "b": [true, "x"]}"#).unwrap();
/// let blob = buf.finish().unwrap();
/// assert_eq!(format_json(&blob, false), r#"{"a":1,"b":[1,"x"]}"#);
/// ```
pub fn add_json_str(buf: &mut BlobBuf, text: &str) -> std::result::Result<(), JsonError> {
    let value: Value = serde_json::from_str(text)?;
    add_json_value(buf, &value)
}

/// Appends the members of a JSON object to the current scope of `buf`.
///
/// Mapping: object to table, array to array, string to string, bool to
/// int8, integers in `0..=u32::MAX` to int32, other integers to int64 (two's
/// complement), other numbers to double, null to unspec.
///
/// On error everything appended by this call is rolled back and the builder
/// is left as it was.
pub fn add_json_value(buf: &mut BlobBuf, value: &Value) -> std::result::Result<(), JsonError> {
    let Value::Object(map) = value else {
        return Err(JsonError::NotAnObject);
    };
    let mark = buf.mark();
    if let Err(err) = add_members(buf, map) {
        tracing::debug!(error = %err, "JSON import rolled back");
        buf.rollback(mark);
        return Err(err.into());
    }
    Ok(())
}

fn add_members(buf: &mut BlobBuf, map: &Map<String, Value>) -> Result<()> {
    for (name, value) in map {
        add_value(buf, Some(name.as_str()), value)?;
    }
    Ok(())
}

fn add_value(buf: &mut BlobBuf, name: Option<&str>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.add_unspec(name),
        Value::Bool(b) => buf.add_bool(name, *b),
        Value::Number(n) => add_number(buf, name, n),
        Value::String(s) => buf.add_string(name, s),
        Value::Array(items) => {
            let scope = buf.open_array(name)?;
            for item in items {
                add_value(buf, None, item)?;
            }
            buf.close(scope)
        }
        Value::Object(map) => {
            let scope = buf.open_table(name)?;
            add_members(buf, map)?;
            buf.close(scope)
        }
    }
}

fn add_number(buf: &mut BlobBuf, name: Option<&str>, n: &Number) -> Result<()> {
    if let Some(u) = n.as_u64() {
        return match u32::try_from(u) {
            Ok(small) => buf.add_u32(name, small),
            Err(_) => buf.add_u64(name, u),
        };
    }
    if let Some(i) = n.as_i64() {
        return buf.add_u64(name, i as u64);
    }
    buf.add_double(name, n.as_f64().unwrap_or(f64::NAN))
}
