//! Transport abstraction for the sync channel.
//!
//! The transport owns connections and peer discovery. This crate only asks
//! it who the bootstrap peers for a topic are and hands it messages to send.
//! A send is fire-and-forget once issued; timeouts are the transport's job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use weft_core::{PeerKey, TopicHash};

use crate::error::Result;
use crate::messages::SyncMessage;

/// Transport trait for sending and receiving sync messages.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the local peer's identity.
    fn local_peer(&self) -> PeerKey;

    /// Peers currently connected for `topic` that can serve its state.
    async fn bootstrap_peers(&self, topic: &TopicHash) -> Result<Vec<PeerKey>>;

    /// Send a message to a specific peer.
    async fn send(&self, peer: &PeerKey, message: SyncMessage) -> Result<()>;

    /// Receive the next message from any peer.
    async fn recv(&self) -> Result<(PeerKey, SyncMessage)>;

    /// Receive with timeout.
    ///
    /// Returns None if timeout expires before a message arrives.
    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<(PeerKey, SyncMessage)>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn local_peer(&self) -> PeerKey {
        (**self).local_peer()
    }

    async fn bootstrap_peers(&self, topic: &TopicHash) -> Result<Vec<PeerKey>> {
        (**self).bootstrap_peers(topic).await
    }

    async fn send(&self, peer: &PeerKey, message: SyncMessage) -> Result<()> {
        (**self).send(peer, message).await
    }

    async fn recv(&self) -> Result<(PeerKey, SyncMessage)> {
        (**self).recv().await
    }

    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<(PeerKey, SyncMessage)>> {
        (**self).recv_timeout(timeout).await
    }
}

/// Connection-lifecycle events reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connections for `topic` are up to these peers.
    PeersConnected {
        topic: TopicHash,
        peers: Vec<PeerKey>,
    },
    /// A peer went away.
    PeerDisconnected { peer: PeerKey },
}

/// A simple in-memory transport for testing.
///
/// Messages travel as JSON text so the wire encoding is exercised too.
pub mod memory {
    use super::*;
    use std::collections::{BTreeSet, HashMap};

    use tokio::sync::{mpsc, Mutex, RwLock};

    use crate::error::SyncError;

    /// Message envelope for internal routing.
    #[derive(Debug, Clone)]
    struct Envelope {
        from: PeerKey,
        text: String,
    }

    /// Shared state for the memory transport network.
    #[derive(Default)]
    pub struct MemoryNetwork {
        /// Sender channels for each peer.
        senders: RwLock<HashMap<PeerKey, mpsc::Sender<Envelope>>>,
        /// Peers joined to each topic.
        topics: RwLock<HashMap<TopicHash, BTreeSet<PeerKey>>>,
    }

    impl MemoryNetwork {
        /// Create a new memory network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Create a transport connected to this network.
        pub async fn create_transport(self: &Arc<Self>, peer: PeerKey) -> MemoryTransport {
            let (tx, rx) = mpsc::channel(1000);

            self.senders.write().await.insert(peer, tx);

            MemoryTransport {
                peer,
                network: Arc::clone(self),
                receiver: Mutex::new(rx),
            }
        }

        /// Drop a peer from the network. Later sends to it fail.
        pub async fn disconnect(&self, peer: &PeerKey) {
            self.senders.write().await.remove(peer);
            for members in self.topics.write().await.values_mut() {
                members.remove(peer);
            }
        }

        /// Peers joined to `topic`.
        pub async fn members(&self, topic: &TopicHash) -> Vec<PeerKey> {
            self.topics
                .read()
                .await
                .get(topic)
                .map(|m| m.iter().copied().collect())
                .unwrap_or_default()
        }
    }

    /// In-memory transport implementation.
    pub struct MemoryTransport {
        peer: PeerKey,
        network: Arc<MemoryNetwork>,
        receiver: Mutex<mpsc::Receiver<Envelope>>,
    }

    impl MemoryTransport {
        /// Announce interest in a topic.
        pub async fn join_topic(&self, topic: TopicHash) {
            self.network
                .topics
                .write()
                .await
                .entry(topic)
                .or_default()
                .insert(self.peer);
        }

        /// Withdraw interest in a topic.
        pub async fn leave_topic(&self, topic: &TopicHash) {
            if let Some(members) = self.network.topics.write().await.get_mut(topic) {
                members.remove(&self.peer);
            }
        }

        fn decode(envelope: Envelope) -> Result<(PeerKey, SyncMessage)> {
            Ok((envelope.from, SyncMessage::from_json(&envelope.text)?))
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        fn local_peer(&self) -> PeerKey {
            self.peer
        }

        async fn bootstrap_peers(&self, topic: &TopicHash) -> Result<Vec<PeerKey>> {
            let peers = self.network.members(topic).await;
            Ok(peers.into_iter().filter(|p| p != &self.peer).collect())
        }

        async fn send(&self, peer: &PeerKey, message: SyncMessage) -> Result<()> {
            let text = message.to_json()?;
            let sender = self
                .network
                .senders
                .read()
                .await
                .get(peer)
                .cloned()
                .ok_or_else(|| SyncError::PeerNotConnected(peer.to_string()))?;

            sender
                .send(Envelope {
                    from: self.peer,
                    text,
                })
                .await
                .map_err(|_| SyncError::TransportError("peer disconnected".into()))
        }

        async fn recv(&self) -> Result<(PeerKey, SyncMessage)> {
            let mut rx = self.receiver.lock().await;
            match rx.recv().await {
                Some(envelope) => Self::decode(envelope),
                None => Err(SyncError::ChannelClosed),
            }
        }

        async fn recv_timeout(
            &self,
            timeout: Duration,
        ) -> Result<Option<(PeerKey, SyncMessage)>> {
            let mut rx = self.receiver.lock().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(envelope)) => Self::decode(envelope).map(Some),
                Ok(None) => Err(SyncError::ChannelClosed),
                Err(_) => Ok(None),
            }
        }
    }
}
