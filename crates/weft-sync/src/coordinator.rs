//! Bootstrap sync coordination.
//!
//! When a peer joins a topic and the transport reports bootstrap peers, the
//! coordinator waits a short settle delay so half-open connections finish
//! their handshake, then asks every bootstrap peer for full state.
//!
//! ```text
//! Idle -> ConnectingPeers -> Stabilizing -> (settle delay) -> RequestsSent
//! ```
//!
//! The peer list is snapshotted at join time and not re-queried. Sends go out
//! in parallel; a failure for one peer is logged and never affects the rest.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use weft_core::{PeerKey, TopicHash};

use crate::messages::SyncMessage;
use crate::transport::Transport;

/// Settle delay before bootstrap requests go out.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Where a topic is in the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    /// Not joined.
    Idle,
    /// Joined, waiting for the transport to report bootstrap peers.
    ConnectingPeers,
    /// Bootstrap peers known; settle delay running.
    Stabilizing,
    /// The sync-request batch has been issued.
    RequestsSent,
}

/// Configuration for bootstrap behavior.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Wait between learning the peer set and sending requests.
    pub settle_delay: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// A send that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub peer: PeerKey,
    pub reason: String,
}

/// Result of one sync-request batch.
#[derive(Debug, Clone, Default)]
pub struct SyncBatchReport {
    /// Peers the request was handed to.
    pub sent: Vec<PeerKey>,
    /// Peers whose send failed.
    pub failed: Vec<PeerFailure>,
}

impl SyncBatchReport {
    /// Number of peers a send was attempted for.
    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }

    /// Whether every send succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What `join` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Settle delay started; requests will follow.
    Scheduled,
    /// Nothing to bootstrap from. Not an error: the peer may be first.
    NoBootstrapPeers,
    /// A batch for this topic is already waiting to go out.
    AlreadyPending,
}

struct TopicState {
    phase: watch::Receiver<SyncPhase>,
    task: Option<JoinHandle<SyncBatchReport>>,
}

impl TopicState {
    fn is_pending(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

/// Send one sync-request to each peer, in parallel.
///
/// Never fails as a whole; per-peer failures are logged and reported.
pub async fn request_sync<T>(transport: Arc<T>, topic: TopicHash, peers: Vec<PeerKey>) -> SyncBatchReport
where
    T: Transport + ?Sized + 'static,
{
    let mut report = SyncBatchReport::default();
    let mut outstanding: HashSet<PeerKey> = peers.iter().copied().collect();
    let mut sends = JoinSet::new();

    for peer in peers {
        let transport = Arc::clone(&transport);
        sends.spawn(async move {
            let result = transport
                .send(&peer, SyncMessage::SyncRequest { topic })
                .await;
            (peer, result)
        });
    }

    while let Some(joined) = sends.join_next().await {
        match joined {
            Ok((peer, Ok(()))) => {
                tracing::debug!(%topic, %peer, "sent sync-request");
                outstanding.remove(&peer);
                report.sent.push(peer);
            }
            Ok((peer, Err(e))) => {
                tracing::warn!(%topic, %peer, error = %e, "sync-request send failed");
                outstanding.remove(&peer);
                report.failed.push(PeerFailure {
                    peer,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(%topic, error = %e, "sync-request send task did not complete");
            }
        }
    }

    // Tasks that panicked or were cancelled never reported their peer.
    for peer in outstanding {
        report.failed.push(PeerFailure {
            peer,
            reason: "send task did not complete".into(),
        });
    }

    tracing::info!(
        %topic,
        sent = report.sent.len(),
        failed = report.failed.len(),
        "bootstrap sync requests issued"
    );
    report
}

/// Schedules bootstrap sync per topic.
///
/// Each scheduled topic gets one task that owns the phase sender, so phase
/// has a single writer. Dropping the coordinator cancels pending timers.
pub struct BootstrapCoordinator<T: ?Sized> {
    transport: Arc<T>,
    config: BootstrapConfig,
    topics: HashMap<TopicHash, TopicState>,
}

impl<T> BootstrapCoordinator<T>
where
    T: Transport + ?Sized + 'static,
{
    /// Create a coordinator over a transport.
    pub fn new(transport: Arc<T>, config: BootstrapConfig) -> Self {
        Self {
            transport,
            config,
            topics: HashMap::new(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Record a topic join and schedule sync against `peers`.
    ///
    /// Must be called from within a tokio runtime when `peers` is non-empty.
    pub fn join(&mut self, topic: TopicHash, peers: Vec<PeerKey>) -> JoinOutcome {
        if self.topics.get(&topic).map_or(false, TopicState::is_pending) {
            tracing::debug!(%topic, "bootstrap sync already pending");
            return JoinOutcome::AlreadyPending;
        }

        if peers.is_empty() {
            tracing::info!(%topic, "no bootstrap peers, skipping initial sync");
            let (_, phase) = watch::channel(SyncPhase::ConnectingPeers);
            self.topics.insert(topic, TopicState { phase, task: None });
            return JoinOutcome::NoBootstrapPeers;
        }

        let (phase_tx, phase) = watch::channel(SyncPhase::Stabilizing);
        let transport = Arc::clone(&self.transport);
        let delay = self.config.settle_delay;
        let deadline = tokio::time::Instant::now() + delay;

        tracing::debug!(%topic, peers = peers.len(), ?delay, "scheduling bootstrap sync");
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let report = request_sync(transport, topic, peers).await;
            phase_tx.send_replace(SyncPhase::RequestsSent);
            report
        });

        self.topics.insert(
            topic,
            TopicState {
                phase,
                task: Some(task),
            },
        );
        JoinOutcome::Scheduled
    }

    /// Current phase for a topic.
    pub fn phase(&self, topic: &TopicHash) -> SyncPhase {
        self.topics
            .get(topic)
            .map_or(SyncPhase::Idle, |state| *state.phase.borrow())
    }

    /// Watch phase changes for a topic.
    pub fn subscribe(&self, topic: &TopicHash) -> Option<watch::Receiver<SyncPhase>> {
        self.topics.get(topic).map(|state| state.phase.clone())
    }

    /// Whether a batch for `topic` is waiting to go out.
    pub fn is_pending(&self, topic: &TopicHash) -> bool {
        self.topics.get(topic).map_or(false, TopicState::is_pending)
    }

    /// Topics currently joined.
    pub fn topics(&self) -> impl Iterator<Item = &TopicHash> {
        self.topics.keys()
    }

    /// Wait for the scheduled batch of a topic to finish.
    ///
    /// Returns `None` if nothing was scheduled, the batch was already
    /// collected, or it was cancelled.
    pub async fn wait(&mut self, topic: &TopicHash) -> Option<SyncBatchReport> {
        let task = self.topics.get_mut(topic)?.task.take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::debug!(%topic, error = %e, "bootstrap sync task ended without a report");
                None
            }
        }
    }

    /// Leave a topic, cancelling a pending settle delay.
    ///
    /// Returns whether the topic was joined.
    pub fn leave(&mut self, topic: &TopicHash) -> bool {
        match self.topics.remove(topic) {
            Some(state) => {
                if let Some(task) = state.task {
                    if !task.is_finished() {
                        tracing::debug!(%topic, "cancelled pending bootstrap sync");
                    }
                    task.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Leave every topic.
    pub fn shutdown(&mut self) {
        let topics: Vec<TopicHash> = self.topics.keys().copied().collect();
        for topic in topics {
            self.leave(&topic);
        }
    }
}

impl<T: ?Sized> Drop for BootstrapCoordinator<T> {
    fn drop(&mut self) {
        for state in self.topics.values() {
            if let Some(task) = &state.task {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SyncError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records sends; fails for the configured peers.
    #[derive(Default)]
    struct RecordingTransport {
        failing: HashSet<PeerKey>,
        sent: Mutex<Vec<(PeerKey, SyncMessage)>>,
    }

    impl RecordingTransport {
        fn failing(peers: &[PeerKey]) -> Self {
            Self {
                failing: peers.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn sent_to(&self) -> Vec<PeerKey> {
            let mut peers: Vec<_> = self.sent.lock().unwrap().iter().map(|(p, _)| *p).collect();
            peers.sort();
            peers
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn local_peer(&self) -> PeerKey {
            PeerKey::from_bytes([0; 32])
        }

        async fn bootstrap_peers(&self, _topic: &TopicHash) -> Result<Vec<PeerKey>> {
            Ok(Vec::new())
        }

        async fn send(&self, peer: &PeerKey, message: SyncMessage) -> Result<()> {
            if self.failing.contains(peer) {
                return Err(SyncError::TransportError("connection reset".into()));
            }
            self.sent.lock().unwrap().push((*peer, message));
            Ok(())
        }

        async fn recv(&self) -> Result<(PeerKey, SyncMessage)> {
            Err(SyncError::ChannelClosed)
        }

        async fn recv_timeout(&self, _timeout: Duration) -> Result<Option<(PeerKey, SyncMessage)>> {
            Ok(None)
        }
    }

    fn peer(b: u8) -> PeerKey {
        PeerKey::from_bytes([b; 32])
    }

    fn topic() -> TopicHash {
        TopicHash::from_bytes([0x3f; 32])
    }

    #[tokio::test]
    async fn test_partial_failure_isolated() {
        let transport = Arc::new(RecordingTransport::failing(&[peer(2)]));
        let report = request_sync(
            Arc::clone(&transport),
            topic(),
            vec![peer(1), peer(2), peer(3)],
        )
        .await;

        assert_eq!(transport.sent_to(), vec![peer(1), peer(3)]);
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].peer, peer(2));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_requests_carry_topic() {
        let transport = Arc::new(RecordingTransport::default());
        request_sync(Arc::clone(&transport), topic(), vec![peer(1)]).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].1, SyncMessage::SyncRequest { topic: topic() });
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_then_send() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        assert_eq!(coordinator.phase(&topic()), SyncPhase::Idle);
        let outcome = coordinator.join(topic(), vec![peer(1), peer(2), peer(3)]);
        assert_eq!(outcome, JoinOutcome::Scheduled);
        assert_eq!(coordinator.phase(&topic()), SyncPhase::Stabilizing);

        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(transport.sent_to().is_empty());
        assert!(coordinator.is_pending(&topic()));

        let report = coordinator.wait(&topic()).await.unwrap();
        assert_eq!(report.sent.len(), 3);
        assert_eq!(coordinator.phase(&topic()), SyncPhase::RequestsSent);
        assert_eq!(transport.sent_to(), vec![peer(1), peer(2), peer(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_bootstrap_peers() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        assert_eq!(coordinator.join(topic(), Vec::new()), JoinOutcome::NoBootstrapPeers);
        assert_eq!(coordinator.phase(&topic()), SyncPhase::ConnectingPeers);
        assert!(coordinator.wait(&topic()).await.is_none());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(transport.sent_to().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_peers_after_empty_join_schedule() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        coordinator.join(topic(), Vec::new());
        assert_eq!(coordinator.join(topic(), vec![peer(7)]), JoinOutcome::Scheduled);
        assert_eq!(coordinator.wait(&topic()).await.unwrap().sent, vec![peer(7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_batch_per_join() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        assert_eq!(coordinator.join(topic(), vec![peer(1)]), JoinOutcome::Scheduled);
        assert_eq!(
            coordinator.join(topic(), vec![peer(1), peer(2)]),
            JoinOutcome::AlreadyPending
        );

        coordinator.wait(&topic()).await.unwrap();
        assert_eq!(transport.sent_to(), vec![peer(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_cancels_settle_delay() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        coordinator.join(topic(), vec![peer(1)]);
        tokio::task::yield_now().await;
        assert!(coordinator.leave(&topic()));
        assert_eq!(coordinator.phase(&topic()), SyncPhase::Idle);

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(transport.sent_to().is_empty());
        assert!(!coordinator.leave(&topic()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_all() {
        let transport = Arc::new(RecordingTransport::default());
        let mut coordinator =
            BootstrapCoordinator::new(Arc::clone(&transport), BootstrapConfig::default());

        coordinator.join(TopicHash::from_bytes([1; 32]), vec![peer(1)]);
        coordinator.join(TopicHash::from_bytes([2; 32]), vec![peer(2)]);
        coordinator.shutdown();
        assert_eq!(coordinator.topics().count(), 0);

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(transport.sent_to().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_settle_delay() {
        let transport = Arc::new(RecordingTransport::default());
        let config = BootstrapConfig {
            settle_delay: Duration::from_millis(10),
        };
        let mut coordinator = BootstrapCoordinator::new(Arc::clone(&transport), config);

        coordinator.join(topic(), vec![peer(1)]);
        let mut phase = coordinator.subscribe(&topic()).unwrap();
        tokio::time::advance(Duration::from_millis(11)).await;
        phase
            .wait_for(|p| *p == SyncPhase::RequestsSent)
            .await
            .unwrap();
        assert_eq!(transport.sent_to(), vec![peer(1)]);
    }
}
