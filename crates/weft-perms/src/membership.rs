//! Membership snapshots delivered by the replicated membership record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use weft_core::PeerKey;

/// One member's entry.
///
/// `permission` is kept as the raw text from the record; values this client
/// does not understand are ignored during reconciliation rather than
/// rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub permission: String,
}

/// Snapshot of the authoritative membership mapping.
///
/// Serialized as a JSON object keyed by hex peer key:
/// `{"<hex>": {"permission": "editor"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Membership {
    members: HashMap<PeerKey, MemberRecord>,
}

impl Membership {
    /// Empty membership.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member.
    pub fn insert(&mut self, peer: PeerKey, permission: impl Into<String>) -> &mut Self {
        self.members.insert(
            peer,
            MemberRecord {
                permission: permission.into(),
            },
        );
        self
    }

    /// Remove a member.
    pub fn remove(&mut self, peer: &PeerKey) -> Option<MemberRecord> {
        self.members.remove(peer)
    }

    /// Record for a member.
    pub fn get(&self, peer: &PeerKey) -> Option<&MemberRecord> {
        self.members.get(peer)
    }

    /// Raw permission text for a member.
    pub fn permission_of(&self, peer: &PeerKey) -> Option<&str> {
        self.members.get(peer).map(|r| r.permission.as_str())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate members.
    pub fn iter(&self) -> impl Iterator<Item = (&PeerKey, &MemberRecord)> {
        self.members.iter()
    }
}

impl FromIterator<(PeerKey, String)> for Membership {
    fn from_iter<I: IntoIterator<Item = (PeerKey, String)>>(iter: I) -> Self {
        let mut membership = Membership::new();
        for (peer, permission) in iter {
            membership.insert(peer, permission);
        }
        membership
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let peer = PeerKey::from_bytes([0xab; 32]);
        let text = format!(r#"{{"{}":{{"permission":"editor"}}}}"#, "ab".repeat(32));

        let membership: Membership = serde_json::from_str(&text).unwrap();
        assert_eq!(membership.permission_of(&peer), Some("editor"));
        assert_eq!(serde_json::to_string(&membership).unwrap(), text);
    }

    #[test]
    fn test_unknown_permission_kept_verbatim() {
        let peer = PeerKey::from_bytes([1; 32]);
        let membership: Membership = [(peer, "superuser".to_string())].into_iter().collect();
        assert_eq!(membership.permission_of(&peer), Some("superuser"));
        assert_eq!(membership.len(), 1);
    }
}
