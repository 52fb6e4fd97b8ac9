//! JSON bridge: rendering trees as JSON text and importing JSON documents.

mod error;
mod format;
mod import;

pub use error::JsonError;
pub use format::{format_json, format_json_value, to_json_value, value_to_json, Indent, JsonFormat};
pub use import::{add_json_str, add_json_value};
