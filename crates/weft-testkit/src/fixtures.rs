//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use weft_core::{Keypair, PeerKey, TopicHash};
use weft_perms::{Notifier, Severity};
use weft_sync::{Result as SyncResult, SyncError, SyncMessage, Transport};

/// Deterministic peer identity from a one-byte seed.
pub fn peer(seed: u8) -> PeerKey {
    Keypair::from_seed(&[seed; 32]).peer_key()
}

/// `n` distinct deterministic peers, seeded 1..=n.
pub fn peers(n: u8) -> Vec<PeerKey> {
    (1..=n).map(peer).collect()
}

/// Notifier that records everything it is asked to show.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notes: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn notes(&self) -> Vec<(String, Severity)> {
        self.notes.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Number of notifications recorded.
    pub fn count(&self) -> usize {
        self.notes.lock().map(|n| n.len()).unwrap_or(0)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut notes) = self.notes.lock() {
            notes.push((message.to_string(), severity));
        }
    }
}

/// Transport with scripted bootstrap peers and failures.
///
/// Sends are recorded instead of delivered. Messages can be injected for
/// `recv` with [`ScriptedTransport::deliver`].
pub struct ScriptedTransport {
    local: PeerKey,
    bootstrap: Mutex<HashMap<TopicHash, Vec<PeerKey>>>,
    failing: Mutex<HashSet<PeerKey>>,
    sent: Arc<Mutex<Vec<(PeerKey, SyncMessage)>>>,
    inbox_tx: mpsc::UnboundedSender<(PeerKey, SyncMessage)>,
    inbox_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(PeerKey, SyncMessage)>>,
}

impl ScriptedTransport {
    /// Create a transport for `local` with no peers.
    pub fn new(local: PeerKey) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            local,
            bootstrap: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            inbox_tx,
            inbox_rx: tokio::sync::Mutex::new(inbox_rx),
        }
    }

    /// Report `peers` as the bootstrap peers for `topic`.
    pub fn with_bootstrap(self, topic: TopicHash, peers: Vec<PeerKey>) -> Self {
        if let Ok(mut bootstrap) = self.bootstrap.lock() {
            bootstrap.insert(topic, peers);
        }
        self
    }

    /// Make sends to `peer` fail immediately.
    pub fn failing_for(self, peer: PeerKey) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(peer);
        }
        self
    }

    /// Handle onto the record of sends, usable after the transport has been
    /// moved into a session.
    pub fn sent_log(&self) -> SentLog {
        SentLog(Arc::clone(&self.sent))
    }

    /// Queue a message as if `from` had sent it.
    pub fn deliver(&self, from: PeerKey, message: SyncMessage) {
        let _ = self.inbox_tx.send((from, message));
    }
}

/// Shared view of a [`ScriptedTransport`]'s sends.
#[derive(Clone)]
pub struct SentLog(Arc<Mutex<Vec<(PeerKey, SyncMessage)>>>);

impl SentLog {
    /// All sends, in completion order.
    pub fn all(&self) -> Vec<(PeerKey, SyncMessage)> {
        self.0.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Recipients, sorted.
    pub fn recipients(&self) -> Vec<PeerKey> {
        let mut peers: Vec<_> = self.all().into_iter().map(|(p, _)| p).collect();
        peers.sort();
        peers
    }

    /// Number of sync-requests sent.
    pub fn sync_requests(&self) -> usize {
        self.all()
            .iter()
            .filter(|(_, m)| matches!(m, SyncMessage::SyncRequest { .. }))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn local_peer(&self) -> PeerKey {
        self.local
    }

    async fn bootstrap_peers(&self, topic: &TopicHash) -> SyncResult<Vec<PeerKey>> {
        Ok(self
            .bootstrap
            .lock()
            .map(|b| b.get(topic).cloned().unwrap_or_default())
            .unwrap_or_default())
    }

    async fn send(&self, peer: &PeerKey, message: SyncMessage) -> SyncResult<()> {
        let failing = self.failing.lock().map(|f| f.contains(peer)).unwrap_or(false);
        if failing {
            return Err(SyncError::TransportError(format!("send to {} refused", peer)));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((*peer, message));
        }
        Ok(())
    }

    async fn recv(&self) -> SyncResult<(PeerKey, SyncMessage)> {
        self.inbox_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(SyncError::ChannelClosed)
    }

    async fn recv_timeout(&self, timeout: Duration) -> SyncResult<Option<(PeerKey, SyncMessage)>> {
        let mut rx = self.inbox_rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => Err(SyncError::ChannelClosed),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peers_distinct_and_stable() {
        let a = peers(5);
        let b = peers(5);
        assert_eq!(a, b);
        assert_eq!(a.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn test_recording_notifier_shares_log() {
        let notifier = RecordingNotifier::new();
        let clone = notifier.clone();
        clone.notify("hello", Severity::Info);
        assert_eq!(notifier.notes(), vec![("hello".to_string(), Severity::Info)]);
    }

    #[tokio::test]
    async fn test_scripted_transport() {
        let topic = TopicHash::from_bytes([1; 32]);
        let transport = ScriptedTransport::new(peer(0))
            .with_bootstrap(topic, peers(2))
            .failing_for(peer(2));
        let log = transport.sent_log();

        assert_eq!(transport.bootstrap_peers(&topic).await.unwrap(), peers(2));
        transport
            .send(&peer(1), SyncMessage::SyncRequest { topic })
            .await
            .unwrap();
        assert!(transport
            .send(&peer(2), SyncMessage::SyncRequest { topic })
            .await
            .is_err());
        assert_eq!(log.recipients(), vec![peer(1)]);

        transport.deliver(peer(1), SyncMessage::SyncRequest { topic });
        let (from, _) = transport.recv().await.unwrap();
        assert_eq!(from, peer(1));
    }
}
