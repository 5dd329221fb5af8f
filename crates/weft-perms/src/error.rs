//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission operations.
///
/// Only loading the cached permission can fail; reconciling an observation
/// never returns an error.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] weft_store::StoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
