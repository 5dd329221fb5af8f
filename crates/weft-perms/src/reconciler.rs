//! Keeps the locally cached permission in line with the membership record.
//!
//! The membership record is authoritative; the local cache is only what the
//! rest of the application reads. For each observation:
//!
//! 1. Look up the local peer. Absent or unrecognized: nothing happens.
//! 2. If the value differs from the cache, the cache takes it.
//! 3. Notify only when a previous observation this session exists and
//!    differs from the new one. The first observation never notifies.
//! 4. Remember the value as the previous observation.
//!
//! The reconciler is the only writer of the snapshot. Readers subscribe to
//! a watch channel.

use tokio::sync::{mpsc, watch};
use weft_core::{Permission, PeerKey, WorkspaceId};
use weft_store::{Store, WorkspaceState};

use crate::error::Result;
use crate::membership::Membership;
use crate::notify::{notification_for, Notifier};

/// Permission state as the rest of the application sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalPermissionSnapshot {
    /// Cached value exposed to the application.
    pub cached: Option<Permission>,
    /// Authoritative value at the last observation this session.
    pub previous_authoritative: Option<Permission>,
}

/// What one observation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The local peer has no entry.
    NotMember,
    /// The entry holds a value this client does not understand.
    Unrecognized(String),
    /// A recognized value was observed.
    Observed {
        permission: Permission,
        /// The cached value changed.
        updated: bool,
        /// A notification was emitted.
        notified: bool,
    },
}

/// Reconciles one workspace's cached permission for the local peer.
pub struct PermissionReconciler<S, N> {
    workspace_id: WorkspaceId,
    local_peer: PeerKey,
    store: S,
    notifier: N,
    previous_authoritative: Option<Permission>,
    cached: watch::Sender<Option<Permission>>,
}

impl<S: Store, N: Notifier> PermissionReconciler<S, N> {
    /// Create a reconciler with an empty cache. Call [`load`](Self::load)
    /// to pick up the stored value.
    pub fn new(workspace_id: WorkspaceId, local_peer: PeerKey, store: S, notifier: N) -> Self {
        let (cached, _) = watch::channel(None);
        Self {
            workspace_id,
            local_peer,
            store,
            notifier,
            previous_authoritative: None,
            cached,
        }
    }

    /// Read the cached permission from the store.
    pub async fn load(&mut self) -> Result<Option<Permission>> {
        let stored = self
            .store
            .read_workspace_state(&self.workspace_id)
            .await?
            .and_then(|state| state.my_permission);
        self.cached.send_replace(stored);
        tracing::debug!(workspace = %self.workspace_id, cached = ?stored, "loaded cached permission");
        Ok(stored)
    }

    /// Handle one membership observation.
    pub async fn observe(&mut self, membership: &Membership) -> Reconciled {
        let Some(raw) = membership.permission_of(&self.local_peer) else {
            return Reconciled::NotMember;
        };
        let Some(authoritative) = Permission::parse(raw) else {
            tracing::debug!(workspace = %self.workspace_id, value = raw, "ignoring unrecognized permission");
            return Reconciled::Unrecognized(raw.to_string());
        };

        let cached = *self.cached.borrow();
        let updated = cached != Some(authoritative);
        if updated {
            self.cached.send_replace(Some(authoritative));
            self.persist(authoritative).await;
        }

        let notified = match self.previous_authoritative {
            Some(previous) if previous != authoritative => {
                let (message, severity) = notification_for(authoritative);
                self.notifier.notify(message, severity);
                tracing::info!(
                    workspace = %self.workspace_id,
                    from = %previous,
                    to = %authoritative,
                    "permission changed"
                );
                true
            }
            _ => false,
        };

        self.previous_authoritative = Some(authoritative);

        Reconciled::Observed {
            permission: authoritative,
            updated,
            notified,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> LocalPermissionSnapshot {
        LocalPermissionSnapshot {
            cached: *self.cached.borrow(),
            previous_authoritative: self.previous_authoritative,
        }
    }

    /// Cached permission.
    pub fn permission(&self) -> Option<Permission> {
        *self.cached.borrow()
    }

    /// Read-only view of the cached permission that follows updates.
    pub fn subscribe(&self) -> watch::Receiver<Option<Permission>> {
        self.cached.subscribe()
    }

    /// The workspace being reconciled.
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    async fn persist(&self, permission: Permission) {
        let state = WorkspaceState::with_permission(permission);
        if let Err(e) = self.store.write_workspace_state(&self.workspace_id, &state).await {
            tracing::warn!(
                workspace = %self.workspace_id,
                error = %e,
                "failed to persist permission; keeping in-memory value"
            );
        }
    }
}

/// Process membership observations in delivery order until the channel
/// closes, then hand the reconciler back.
pub async fn run<S: Store, N: Notifier>(
    mut reconciler: PermissionReconciler<S, N>,
    mut events: mpsc::Receiver<Membership>,
) -> PermissionReconciler<S, N> {
    while let Some(membership) = events.recv().await {
        reconciler.observe(&membership).await;
    }
    tracing::debug!(workspace = %reconciler.workspace_id, "membership stream closed");
    reconciler
}
