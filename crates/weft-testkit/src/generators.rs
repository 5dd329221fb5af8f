//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;
use weft_core::{KeyMaterial, PeerKey, TopicHash, WorkspaceKey};

/// Generate a random workspace key.
pub fn workspace_key() -> impl Strategy<Value = WorkspaceKey> {
    any::<[u8; 32]>().prop_map(WorkspaceKey::from_bytes)
}

/// Generate key material in either accepted form.
pub fn key_material() -> impl Strategy<Value = KeyMaterial> {
    (any::<[u8; 32]>(), any::<bool>()).prop_map(|(bytes, as_text)| {
        if as_text {
            KeyMaterial::from(WorkspaceKey::from_bytes(bytes).to_base64().as_str())
        } else {
            KeyMaterial::from(bytes)
        }
    })
}

/// Generate a non-empty room or topic string.
pub fn topic_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:_-]{1,64}"
}

/// Generate a random TopicHash.
pub fn topic_hash() -> impl Strategy<Value = TopicHash> {
    any::<[u8; 32]>().prop_map(TopicHash::from_bytes)
}

/// Generate a random PeerKey.
pub fn peer_key() -> impl Strategy<Value = PeerKey> {
    any::<[u8; 32]>().prop_map(PeerKey::from_bytes)
}

/// Generate arbitrary JSON, including nested objects and arrays.
///
/// Floats are left out so equality after a round-trip is exact.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a permission value as it might appear in the membership record,
/// including values this client does not recognize.
pub fn permission_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => Just("owner".to_string()),
        4 => Just("editor".to_string()),
        4 => Just("viewer".to_string()),
        1 => "[a-z]{3,8}",
    ]
}
