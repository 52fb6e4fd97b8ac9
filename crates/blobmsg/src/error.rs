//! Attribute engine error type.

use blobmsg_buffers::BufferError;
use thiserror::Error;

use crate::BlobmsgType;

pub type Result<T> = std::result::Result<T, BlobError>;

/// Error type for framing, typed access, building and parsing.
///
/// `Truncated` and `Corrupt` describe the input; the parser degrades to
/// fewer bindings when it meets them. `TypeMismatch`, `ScopeMismatch` and
/// `InvalidValue` describe a wrong call sequence by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("buffer ends before the attribute does")]
    Truncated,
    #[error("corrupt attribute: {0}")]
    Corrupt(&'static str),
    #[error("type mismatch: expected {expected}, found type id {actual}")]
    TypeMismatch { expected: BlobmsgType, actual: u8 },
    #[error("scope closed out of order")]
    ScopeMismatch,
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("invalid UTF-8")]
    InvalidUtf8,
}

impl From<BufferError> for BlobError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => BlobError::Truncated,
            BufferError::InvalidUtf8 => BlobError::InvalidUtf8,
            BufferError::Overflow => BlobError::InvalidValue("offset overflow"),
        }
    }
}
