//! Error types for the sync module.

use thiserror::Error;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message could not be encoded or decoded.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Peer is not connected.
    #[error("peer not connected: {0}")]
    PeerNotConnected(String),

    /// The local receive channel has closed.
    #[error("transport channel closed")]
    ChannelClosed,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
