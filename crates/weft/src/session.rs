//! The workspace session: unified API for one workspace on one peer.
//!
//! A session ties together the relay cipher, room authentication, bootstrap
//! sync and permission reconciliation for a single workspace key.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use weft_core::{KeyMaterial, PeerKey, Permission, TopicHash, WorkspaceId, WorkspaceKey};
use weft_perms::{LocalPermissionSnapshot, Membership, Notifier, PermissionReconciler, Reconciled};
use weft_relay::{Admission, RelayAdmission, RelayCipher, RelayError, RoomAuthenticator};
use weft_store::Store;
use weft_sync::{
    BootstrapConfig, BootstrapCoordinator, JoinOutcome, SyncBatchReport, SyncMessage, SyncPhase,
    Transport, TransportEvent,
};

use crate::error::{Result, WeftError};

/// Configuration for a workspace session.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Bootstrap sync configuration.
    pub bootstrap: BootstrapConfig,
    /// Schedule bootstrap sync when peers connect to a joined topic that had
    /// none at join time.
    pub sync_on_peer_connect: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            bootstrap: BootstrapConfig::default(),
            sync_on_peer_connect: true,
        }
    }
}

/// What an inbound message turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A peer wants full state for a topic we joined.
    SyncRequested { from: PeerKey, topic: TopicHash },
    /// A decrypted update for the CRDT layer.
    Update {
        from: PeerKey,
        topic: TopicHash,
        payload: Value,
    },
    /// Foreign topic, wrong key or corrupted data. Not an error.
    Dropped,
}

/// One workspace, opened on this peer.
pub struct WorkspaceSession<S, T, N>
where
    S: Store,
    T: Transport + 'static,
    N: Notifier,
{
    workspace_id: WorkspaceId,
    /// The workspace's own topic.
    topic: TopicHash,
    cipher: RelayCipher,
    authenticator: RoomAuthenticator,
    store: Arc<S>,
    transport: Arc<T>,
    coordinator: BootstrapCoordinator<T>,
    reconciler: PermissionReconciler<Arc<S>, N>,
    joined: HashSet<TopicHash>,
    config: WorkspaceConfig,
}

impl<S, T, N> WorkspaceSession<S, T, N>
where
    S: Store,
    T: Transport + 'static,
    N: Notifier,
{
    /// Open a workspace.
    ///
    /// Fails if the key is not 32 bytes (raw or base64) or the cached
    /// permission cannot be read.
    pub async fn open(
        workspace_id: WorkspaceId,
        key: &KeyMaterial,
        store: S,
        transport: T,
        notifier: N,
        config: WorkspaceConfig,
    ) -> Result<Self> {
        let key = WorkspaceKey::from_material(key)?;
        let store = Arc::new(store);
        let transport = Arc::new(transport);

        let mut reconciler = PermissionReconciler::new(
            workspace_id.clone(),
            transport.local_peer(),
            Arc::clone(&store),
            notifier,
        );
        reconciler.load().await?;

        let topic = TopicHash::derive(&workspace_id);
        tracing::info!(workspace = %workspace_id, %topic, "opened workspace");

        Ok(Self {
            coordinator: BootstrapCoordinator::new(Arc::clone(&transport), config.bootstrap.clone()),
            workspace_id,
            topic,
            cipher: RelayCipher::new(key),
            authenticator: RoomAuthenticator::default(),
            store,
            transport,
            reconciler,
            joined: HashSet::new(),
            config,
        })
    }

    /// Replace the HMAC provider chain.
    pub fn with_authenticator(mut self, authenticator: RoomAuthenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// The workspace ID.
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    /// The workspace's own topic.
    pub fn topic(&self) -> TopicHash {
        self.topic
    }

    /// This peer's identity on the transport.
    pub fn local_peer(&self) -> PeerKey {
        self.transport.local_peer()
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration in use.
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Joining
    // ─────────────────────────────────────────────────────────────────────────

    /// Join the workspace's own topic.
    pub async fn join<R: RelayAdmission + ?Sized>(&mut self, relay: &R) -> Result<JoinOutcome> {
        let topic = self.topic;
        self.join_topic(topic, relay).await
    }

    /// Authenticate to the relay for `topic` and schedule bootstrap sync.
    ///
    /// The room ID presented to the relay is the topic's hex form.
    pub async fn join_topic<R: RelayAdmission + ?Sized>(
        &mut self,
        topic: TopicHash,
        relay: &R,
    ) -> Result<JoinOutcome> {
        let token = self
            .authenticator
            .token_for_topic(self.cipher.key(), &topic)
            .ok_or(WeftError::CryptoUnavailable)?;

        let room = topic.to_hex();
        match relay.admit(&room, &token).await {
            Ok(Admission::Registered) => {
                tracing::info!(%topic, "registered room at relay");
            }
            Ok(Admission::Admitted) => {
                tracing::debug!(%topic, "admitted to room");
            }
            Err(RelayError::AuthenticationRejected { room }) => {
                tracing::warn!(%topic, "relay rejected room token");
                return Err(WeftError::AuthenticationRejected { room });
            }
            Err(e) => return Err(e.into()),
        }

        self.joined.insert(topic);

        let peers = match self.transport.bootstrap_peers(&topic).await {
            Ok(peers) => peers,
            Err(e) => {
                tracing::warn!(%topic, error = %e, "could not list bootstrap peers");
                Vec::new()
            }
        };
        Ok(self.coordinator.join(topic, peers))
    }

    /// Leave a topic, cancelling any pending bootstrap sync.
    pub fn leave_topic(&mut self, topic: &TopicHash) -> bool {
        self.coordinator.leave(topic);
        self.joined.remove(topic)
    }

    /// Whether `topic` has been joined.
    pub fn is_joined(&self, topic: &TopicHash) -> bool {
        self.joined.contains(topic)
    }

    /// Feed a connection-lifecycle event from the transport.
    ///
    /// Returns the scheduling outcome when the event triggered bootstrap sync.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> Option<JoinOutcome> {
        match event {
            TransportEvent::PeersConnected { topic, peers } => {
                if !self.joined.contains(&topic) || !self.config.sync_on_peer_connect {
                    return None;
                }
                if self.coordinator.phase(&topic) != SyncPhase::ConnectingPeers {
                    return None;
                }
                Some(self.coordinator.join(topic, peers))
            }
            TransportEvent::PeerDisconnected { peer } => {
                tracing::debug!(%peer, "peer disconnected");
                None
            }
        }
    }

    /// Bootstrap phase of a topic.
    pub fn sync_phase(&self, topic: &TopicHash) -> SyncPhase {
        self.coordinator.phase(topic)
    }

    /// Wait for a topic's scheduled bootstrap batch.
    pub async fn wait_for_bootstrap(&mut self, topic: &TopicHash) -> Option<SyncBatchReport> {
        self.coordinator.wait(topic).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal `payload` and send it to `peer` as an update on `topic`.
    pub async fn send_update<P: Serialize + ?Sized>(
        &self,
        peer: &PeerKey,
        topic: &TopicHash,
        payload: &P,
    ) -> Result<()> {
        if !self.joined.contains(topic) {
            return Err(WeftError::NotJoined(*topic));
        }
        let sealed = self.cipher.seal(payload).ok_or(WeftError::Seal)?;
        self.transport
            .send(
                peer,
                SyncMessage::Update {
                    topic: *topic,
                    payload: sealed,
                },
            )
            .await?;
        Ok(())
    }

    /// Classify an inbound message, decrypting updates.
    pub fn handle_message(&self, from: PeerKey, message: SyncMessage) -> Inbound {
        if !self.joined.contains(message.topic()) {
            tracing::debug!(%from, topic = %message.topic(), "dropping message for unjoined topic");
            return Inbound::Dropped;
        }

        match message {
            SyncMessage::SyncRequest { topic } => Inbound::SyncRequested { from, topic },
            SyncMessage::Update { topic, payload } => match self.cipher.open::<Value>(&payload) {
                Some(payload) => Inbound::Update {
                    from,
                    topic,
                    payload,
                },
                None => Inbound::Dropped,
            },
        }
    }

    /// Receive and classify the next message from the transport.
    pub async fn next_inbound(&self) -> Result<Inbound> {
        let (from, message) = self.transport.recv().await?;
        Ok(self.handle_message(from, message))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Reconcile against a new membership snapshot.
    pub async fn observe_membership(&mut self, membership: &Membership) -> Reconciled {
        self.reconciler.observe(membership).await
    }

    /// The cached permission for this peer.
    pub fn my_permission(&self) -> Option<Permission> {
        self.reconciler.permission()
    }

    /// The full permission snapshot.
    pub fn permission_snapshot(&self) -> LocalPermissionSnapshot {
        self.reconciler.snapshot()
    }

    /// Follow permission changes.
    pub fn subscribe_permission(&self) -> watch::Receiver<Option<Permission>> {
        self.reconciler.subscribe()
    }

    /// Close the session: cancel pending settle timers and drop the key.
    pub fn close(mut self) {
        self.coordinator.shutdown();
        self.joined.clear();
        tracing::info!(workspace = %self.workspace_id, "closed workspace");
    }
}
