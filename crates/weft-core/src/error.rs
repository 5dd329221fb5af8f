//! Error types for Weft Core.

use thiserror::Error;

/// Errors raised while constructing core types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("key material is empty")]
    EmptyKey,

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("invalid hex identifier: {0}")]
    InvalidHex(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
