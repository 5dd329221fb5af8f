//! Golden room-token vectors.
//!
//! Any implementation given the same key and topic must produce exactly
//! these strings, or peers on different platforms cannot share a room.

use weft_core::KeyMaterial;
use weft_relay::RoomAuthenticator;

/// A golden token vector.
#[derive(Debug, Clone)]
pub struct GoldenToken {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Workspace key.
    pub key: [u8; 32],
    /// Room or topic string.
    pub topic: &'static str,
    /// Expected base64 token.
    pub expected: &'static str,
}

/// Bytes 0, 1, ..., 31.
const fn counting_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        key[i] = i as u8;
        i += 1;
    }
    key
}

/// Get all golden token vectors.
pub fn all_vectors() -> Vec<GoldenToken> {
    vec![
        GoldenToken {
            name: "zero key, room1",
            key: [0x00; 32],
            topic: "room1",
            expected: "PZGF3OQP888Pi+g9MkDLhF+ZIMs/UZVeEkO3hmdLXOo=",
        },
        GoldenToken {
            name: "0x42 key, named workspace",
            key: [0x42; 32],
            topic: "workspace-alpha",
            expected: "9rte36WsgbWp+ZiYRYE0cRo0uvtH7DdVieXgHgjD/GA=",
        },
        GoldenToken {
            name: "counting key, short hex topic",
            key: counting_key(),
            topic: "3f1c9a",
            expected: "BSPRwf6ONRmeMbjS2Mw/iXZTF7dbuTUFOjNTFkYBXbQ=",
        },
    ]
}

/// Check every vector against an authenticator.
///
/// Returns the names of vectors that did not match.
pub fn verify_all_vectors(authenticator: &RoomAuthenticator) -> Vec<&'static str> {
    all_vectors()
        .into_iter()
        .filter(|v| {
            authenticator
                .derive_token(&KeyMaterial::from(v.key), v.topic)
                .map_or(true, |token| token.as_str() != v.expected)
        })
        .map(|v| v.name)
        .collect()
}
