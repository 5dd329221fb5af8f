//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use weft_core::{RoomToken, WorkspaceId};

use crate::error::{Result, StoreError};
use crate::traits::{Registration, Store, WorkspaceState};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Cached workspace state.
    workspaces: HashMap<WorkspaceId, WorkspaceState>,

    /// Room ID -> first registered token.
    registrations: HashMap<String, RoomToken>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<WorkspaceState>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.workspaces.get(workspace_id).cloned())
    }

    async fn write_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
        state: &WorkspaceState,
    ) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.workspaces.insert(workspace_id.clone(), state.clone());
        Ok(())
    }

    async fn register_room(&self, room: &str, token: &RoomToken) -> Result<Registration> {
        // Check and set under one write guard.
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(existing) = inner.registrations.get(room) {
            return Ok(if existing == token {
                Registration::Matched
            } else {
                Registration::Mismatch
            });
        }
        inner.registrations.insert(room.to_string(), token.clone());
        Ok(Registration::Registered)
    }

    async fn room_registration(&self, room: &str) -> Result<Option<RoomToken>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.registrations.get(room).cloned())
    }

    async fn clear_room_registration(&self, room: &str) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.registrations.remove(room).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weft_core::Permission;

    #[tokio::test]
    async fn test_workspace_state_roundtrip() {
        let store = MemoryStore::new();
        let id = WorkspaceId::new("ws");

        assert_eq!(store.read_workspace_state(&id).await.unwrap(), None);

        let state = WorkspaceState::with_permission(Permission::Viewer);
        store.write_workspace_state(&id, &state).await.unwrap();

        assert_eq!(store.read_workspace_state(&id).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let store = MemoryStore::new();
        let first = RoomToken::new("first");
        let second = RoomToken::new("second");

        assert_eq!(
            store.register_room("room", &first).await.unwrap(),
            Registration::Registered
        );
        assert_eq!(
            store.register_room("room", &first).await.unwrap(),
            Registration::Matched
        );
        assert_eq!(
            store.register_room("room", &second).await.unwrap(),
            Registration::Mismatch
        );
        assert_eq!(store.room_registration("room").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_clear_registration_allows_new_token() {
        let store = MemoryStore::new();
        store.register_room("room", &RoomToken::new("stale")).await.unwrap();

        assert!(store.clear_room_registration("room").await.unwrap());
        assert!(!store.clear_room_registration("room").await.unwrap());

        assert_eq!(
            store.register_room("room", &RoomToken::new("fresh")).await.unwrap(),
            Registration::Registered
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_single_winner() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .register_room("contested", &RoomToken::new(format!("token-{}", i)))
                    .await
                    .unwrap()
            }));
        }

        let mut registered = 0;
        for handle in handles {
            if handle.await.unwrap() == Registration::Registered {
                registered += 1;
            }
        }
        assert_eq!(registered, 1);
    }
}
