//! Error types for the relay module.

use thiserror::Error;

/// Errors that can occur while sealing, opening or authenticating.
///
/// The non-`try_` entry points turn every one of these into `None`; the
/// variants exist so callers and logs can tell the cases apart.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Key or topic missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Envelope keys must be exactly 32 bytes.
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A single HMAC provider failed.
    #[error("hmac provider {provider} failed: {reason}")]
    Provider {
        provider: &'static str,
        reason: String,
    },

    /// Every provider in the chain failed.
    #[error("no HMAC-SHA256 implementation available")]
    NoProvider,

    /// Payload could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The AEAD primitive refused to encrypt.
    #[error("encryption failed")]
    Encryption,

    /// Envelope is not base64 or is too short to hold nonce and tag.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Authentication tag did not verify (wrong key or tampered data).
    #[error("envelope failed authentication")]
    Authentication,

    /// Presented token is not a base64 HMAC-SHA256 digest.
    #[error("malformed room token")]
    MalformedToken,

    /// The relay holds a different token for this room.
    #[error("room {room} rejected the presented token")]
    AuthenticationRejected { room: String },

    /// Registration storage failed.
    #[error("store error: {0}")]
    Store(#[from] weft_store::StoreError),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
