//! JSON bridge error type.

use thiserror::Error;

use crate::BlobError;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("top-level JSON value must be an object")]
    NotAnObject,
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
