//! Store trait: the abstract interface for local and relay-side persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use weft_core::{Permission, RoomToken, WorkspaceId};

use crate::error::Result;

/// Locally cached metadata for one workspace.
///
/// Only `my_permission` is owned by this core; other metadata lives elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// The permission this peer last saw for itself.
    pub my_permission: Option<Permission>,
}

impl WorkspaceState {
    /// State with a known permission.
    pub fn with_permission(permission: Permission) -> Self {
        Self {
            my_permission: Some(permission),
        }
    }
}

/// Result of presenting a token for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// No registration existed; the presented token is now authoritative.
    Registered,
    /// A registration existed and the token matches it byte-for-byte.
    Matched,
    /// A registration existed and the token differs.
    Mismatch,
}

impl Registration {
    /// Whether the join should be admitted.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Registration::Mismatch)
    }
}

/// The Store trait: async interface for persistence.
///
/// # Design Notes
///
/// - `register_room` must be an atomic check-and-set: when two callers race
///   with different tokens for an unregistered room, exactly one gets
///   `Registered` and the other gets `Mismatch`.
/// - A registration is immutable until `clear_room_registration` is called.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Workspace State
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the cached state for a workspace.
    async fn read_workspace_state(&self, workspace_id: &WorkspaceId)
        -> Result<Option<WorkspaceState>>;

    /// Write the cached state for a workspace.
    async fn write_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
        state: &WorkspaceState,
    ) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Room Registrations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `token` for `room` if no registration exists, else compare.
    async fn register_room(&self, room: &str, token: &RoomToken) -> Result<Registration>;

    /// Get the registered token for a room.
    async fn room_registration(&self, room: &str) -> Result<Option<RoomToken>>;

    /// Remove a room's registration. Returns whether one existed.
    ///
    /// This is the out-of-band recovery path; nothing in the client calls it.
    async fn clear_room_registration(&self, room: &str) -> Result<bool>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn read_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<WorkspaceState>> {
        (**self).read_workspace_state(workspace_id).await
    }

    async fn write_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
        state: &WorkspaceState,
    ) -> Result<()> {
        (**self).write_workspace_state(workspace_id, state).await
    }

    async fn register_room(&self, room: &str, token: &RoomToken) -> Result<Registration> {
        (**self).register_room(room, token).await
    }

    async fn room_registration(&self, room: &str) -> Result<Option<RoomToken>> {
        (**self).room_registration(room).await
    }

    async fn clear_room_registration(&self, room: &str) -> Result<bool> {
        (**self).clear_room_registration(room).await
    }
}
