//! Identifier and value types shared across the workspace crates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Context string for topic derivation. Changing it changes every topic.
const TOPIC_CONTEXT: &str = "weft-v0 workspace topic";

/// Identifier of a workspace, used as the local state-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Create a workspace ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a room/topic that peers join to exchange sync traffic.
///
/// Textual form is 64 lowercase hex characters; that string is what goes on
/// the wire and what the relay uses as the room ID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicHash(#[serde(with = "hex32")] pub [u8; 32]);

impl TopicHash {
    /// Derive the topic for a workspace.
    ///
    /// Formula: `Blake3-derive-key("weft-v0 workspace topic", workspace_id)`
    pub fn derive(workspace_id: &WorkspaceId) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(TOPIC_CONTEXT);
        hasher.update(workspace_id.as_str().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        hex32::parse(s).map(Self)
    }
}

impl fmt::Debug for TopicHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for TopicHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Proof-of-membership token for a room: base64 of a 32-byte HMAC-SHA256 digest.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomToken(String);

impl RoomToken {
    /// Length of the base64 text for a 32-byte digest.
    pub const ENCODED_LEN: usize = 44;

    /// Wrap an already-encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 text of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "RoomToken({}...)", prefix)
    }
}

/// Permission level of a workspace member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Owner,
    Editor,
    Viewer,
}

impl Permission {
    /// Parse the textual form used in the membership record.
    ///
    /// Unrecognized values yield `None`; callers ignore them.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Permission::Owner),
            "editor" => Some(Permission::Editor),
            "viewer" => Some(Permission::Viewer),
            _ => None,
        }
    }

    /// The textual form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Owner => "owner",
            Permission::Editor => "editor",
            Permission::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde helpers for 32-byte identifiers carried as hex strings.
pub(crate) mod hex32 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::error::{CoreError, Result};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        parse(&text).map_err(D::Error::custom)
    }

    pub fn parse(s: &str) -> Result<[u8; 32]> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        <[u8; 32]>::try_from(bytes)
            .map_err(|b| CoreError::InvalidHex(format!("expected 32 bytes, got {}", b.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_derivation_deterministic() {
        let id = WorkspaceId::new("ws-1");
        assert_eq!(TopicHash::derive(&id), TopicHash::derive(&id));
        assert_ne!(TopicHash::derive(&id), TopicHash::derive(&WorkspaceId::new("ws-2")));
    }

    #[test]
    fn test_topic_hex_form() {
        let topic = TopicHash::derive(&WorkspaceId::new("ws-1"));
        let hex = topic.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(TopicHash::from_hex(&hex).unwrap(), topic);
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::parse("owner"), Some(Permission::Owner));
        assert_eq!(Permission::parse("editor"), Some(Permission::Editor));
        assert_eq!(Permission::parse("viewer"), Some(Permission::Viewer));
        assert_eq!(Permission::parse("admin"), None);
        assert_eq!(Permission::parse("Owner"), None);
    }

    #[test]
    fn test_permission_serde_lowercase() {
        let json = serde_json::to_string(&Permission::Editor).unwrap();
        assert_eq!(json, "\"editor\"");
    }

    #[test]
    fn test_room_token_debug_truncates() {
        let token = RoomToken::new("PZGF3OQP888Pi+g9MkDLhF+ZIMs/UZVeEkO3hmdLXOo=");
        assert_eq!(format!("{:?}", token), "RoomToken(PZGF3OQP...)");
    }
}
