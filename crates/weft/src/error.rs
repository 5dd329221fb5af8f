//! Error types for the workspace session.

use thiserror::Error;
use weft_core::{CoreError, TopicHash};
use weft_perms::PermsError;
use weft_relay::RelayError;
use weft_store::StoreError;
use weft_sync::SyncError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Key or identifier error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Relay error other than a rejected token.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Sync or transport error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Permission error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// No HMAC implementation could produce a room token. The join is
    /// refused rather than attempted unauthenticated.
    #[error("cannot authenticate: no HMAC-SHA256 implementation available")]
    CryptoUnavailable,

    /// The relay holds a different token for this room. Not retried.
    #[error("relay rejected join for room {room}")]
    AuthenticationRejected { room: String },

    /// Payload could not be sealed for the relay.
    #[error("payload could not be sealed")]
    Seal,

    /// The topic has not been joined in this session.
    #[error("topic not joined: {0}")]
    NotJoined(TopicHash),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, WeftError>;
