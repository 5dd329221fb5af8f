//! Wire messages exchanged between peers.
//!
//! Messages are JSON objects tagged by `"type"`:
//!
//! ```text
//! {"type":"sync-request","topic":"<64 hex chars>"}
//! {"type":"update","topic":"<64 hex chars>","payload":"<relay envelope>"}
//! ```

use serde::{Deserialize, Serialize};
use weft_core::TopicHash;

use crate::error::{Result, SyncError};

/// Size limits enforced when decoding.
pub mod limits {
    /// Largest encoded message accepted from the wire.
    pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;
}

/// A message on the sync channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncMessage {
    /// Ask a peer for the full state of a topic.
    SyncRequest {
        /// Topic whose state is requested.
        topic: TopicHash,
    },

    /// CRDT update or full state, sealed for the relay.
    Update {
        /// Topic the update belongs to.
        topic: TopicHash,
        /// `base64(nonce || ciphertext)`; opaque to the transport.
        payload: String,
    },
}

impl SyncMessage {
    /// The topic this message refers to.
    pub fn topic(&self) -> &TopicHash {
        match self {
            SyncMessage::SyncRequest { topic } | SyncMessage::Update { topic, .. } => topic,
        }
    }

    /// Encode to the JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SyncError::InvalidMessage(e.to_string()))
    }

    /// Decode from the JSON wire form.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.len() > limits::MAX_MESSAGE_BYTES {
            return Err(SyncError::InvalidMessage(format!(
                "message of {} bytes exceeds limit",
                text.len()
            )));
        }
        serde_json::from_str(text).map_err(|e| SyncError::InvalidMessage(e.to_string()))
    }
}
