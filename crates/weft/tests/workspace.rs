//! End-to-end session scenarios over the in-memory network.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use weft::core::{KeyMaterial, PeerKey, Permission, TopicHash, WorkspaceId};
use weft::perms::{Membership, Severity};
use weft::relay::{self, RoomAuthenticator, RoomGate};
use weft::store::{MemoryStore, SqliteStore, Store};
use weft::sync::{MemoryNetwork, MemoryTransport, SyncMessage, Transport, TransportEvent};
use weft::{Inbound, JoinOutcome, SyncPhase, WeftError, WorkspaceConfig, WorkspaceSession};
use weft_testkit::fixtures::{peer, peers, RecordingNotifier, ScriptedTransport};

const KEY: [u8; 32] = [0x42; 32];
const OTHER_KEY: [u8; 32] = [0x24; 32];

fn workspace() -> WorkspaceId {
    WorkspaceId::new("design-review")
}

fn topic() -> TopicHash {
    TopicHash::derive(&workspace())
}

async fn open_on_network(
    network: &Arc<MemoryNetwork>,
    me: PeerKey,
    key: [u8; 32],
) -> WorkspaceSession<MemoryStore, MemoryTransport, RecordingNotifier> {
    let transport = network.create_transport(me).await;
    transport.join_topic(topic()).await;
    WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(key),
        MemoryStore::new(),
        transport,
        RecordingNotifier::new(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn second_peer_bootstraps_from_first() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());

    let mut alice = open_on_network(&network, peer(1), KEY).await;
    assert_eq!(alice.join(&gate).await.unwrap(), JoinOutcome::NoBootstrapPeers);

    let mut bob = open_on_network(&network, peer(2), KEY).await;
    assert_eq!(bob.join(&gate).await.unwrap(), JoinOutcome::Scheduled);
    assert_eq!(bob.sync_phase(&topic()), SyncPhase::Stabilizing);

    let report = bob.wait_for_bootstrap(&topic()).await.unwrap();
    assert_eq!(report.sent, vec![peer(1)]);
    assert_eq!(bob.sync_phase(&topic()), SyncPhase::RequestsSent);

    // Alice sees the request and answers with full state.
    assert_eq!(
        alice.next_inbound().await.unwrap(),
        Inbound::SyncRequested {
            from: peer(2),
            topic: topic()
        }
    );
    alice
        .send_update(&peer(2), &topic(), &json!({"doc": "full state", "rev": 7}))
        .await
        .unwrap();

    assert_eq!(
        bob.next_inbound().await.unwrap(),
        Inbound::Update {
            from: peer(1),
            topic: topic(),
            payload: json!({"doc": "full state", "rev": 7}),
        }
    );
}

#[tokio::test]
async fn first_peer_has_no_bootstrap_sources() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());

    let mut alice = open_on_network(&network, peer(1), KEY).await;
    assert_eq!(alice.join(&gate).await.unwrap(), JoinOutcome::NoBootstrapPeers);
    assert_eq!(alice.sync_phase(&topic()), SyncPhase::ConnectingPeers);
    assert!(alice.wait_for_bootstrap(&topic()).await.is_none());
}

#[tokio::test]
async fn wrong_key_is_rejected_by_relay() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());

    let mut alice = open_on_network(&network, peer(1), KEY).await;
    alice.join(&gate).await.unwrap();

    let mut mallory = open_on_network(&network, peer(3), OTHER_KEY).await;
    let err = mallory.join(&gate).await.unwrap_err();
    match err {
        WeftError::AuthenticationRejected { room } => assert_eq!(room, topic().to_hex()),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!mallory.is_joined(&topic()));

    // The registration still belongs to the first key.
    let mut bob = open_on_network(&network, peer(2), KEY).await;
    assert!(bob.join(&gate).await.is_ok());
}

#[tokio::test]
async fn bad_first_registration_locks_out_until_cleared() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());

    let mut stale = open_on_network(&network, peer(3), OTHER_KEY).await;
    stale.join(&gate).await.unwrap();

    let mut alice = open_on_network(&network, peer(1), KEY).await;
    assert!(matches!(
        alice.join(&gate).await,
        Err(WeftError::AuthenticationRejected { .. })
    ));
    assert!(matches!(
        alice.join(&gate).await,
        Err(WeftError::AuthenticationRejected { .. })
    ));

    gate.store()
        .clear_room_registration(&topic().to_hex())
        .await
        .unwrap();
    assert!(alice.join(&gate).await.is_ok());
}

#[tokio::test]
async fn missing_hmac_refuses_join() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());

    let mut alice = open_on_network(&network, peer(1), KEY)
        .await
        .with_authenticator(RoomAuthenticator::new(Vec::new()));
    assert!(matches!(
        alice.join(&gate).await,
        Err(WeftError::CryptoUnavailable)
    ));
    assert!(gate
        .store()
        .room_registration(&topic().to_hex())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn foreign_and_corrupt_updates_are_dropped() {
    let network = MemoryNetwork::new();
    let gate = RoomGate::new(MemoryStore::new());
    let mut alice = open_on_network(&network, peer(1), KEY).await;
    alice.join(&gate).await.unwrap();

    let foreign = relay::seal(&json!({"secret": true}), &OTHER_KEY).unwrap();
    let inbound = alice.handle_message(
        peer(3),
        SyncMessage::Update {
            topic: topic(),
            payload: foreign,
        },
    );
    assert_eq!(inbound, Inbound::Dropped);

    let inbound = alice.handle_message(
        peer(3),
        SyncMessage::Update {
            topic: topic(),
            payload: "bm9pc2U=".into(),
        },
    );
    assert_eq!(inbound, Inbound::Dropped);
}

#[tokio::test(start_paused = true)]
async fn partial_send_failure_does_not_stop_batch() {
    let [p1, p2, p3]: [PeerKey; 3] = peers(3).try_into().unwrap();
    let transport = ScriptedTransport::new(peer(9))
        .with_bootstrap(topic(), vec![p1, p2, p3])
        .failing_for(p2);
    let log = transport.sent_log();

    let mut session = WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(KEY),
        MemoryStore::new(),
        transport,
        RecordingNotifier::new(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap();

    session.join(&RoomGate::new(MemoryStore::new())).await.unwrap();
    let report = session.wait_for_bootstrap(&topic()).await.unwrap();

    let mut recipients = vec![p1, p3];
    recipients.sort();
    assert_eq!(log.recipients(), recipients);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].peer, p2);
    assert_eq!(log.sync_requests(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_cancels_settle_timer() {
    let transport = ScriptedTransport::new(peer(9)).with_bootstrap(topic(), peers(2));
    let log = transport.sent_log();

    let mut session = WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(KEY),
        MemoryStore::new(),
        transport,
        RecordingNotifier::new(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap();

    session.join(&RoomGate::new(MemoryStore::new())).await.unwrap();
    tokio::time::advance(Duration::from_millis(500)).await;
    session.close();

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(log.sync_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn peers_connecting_later_trigger_bootstrap() {
    let transport = ScriptedTransport::new(peer(9));
    let log = transport.sent_log();

    let mut session = WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(KEY),
        MemoryStore::new(),
        transport,
        RecordingNotifier::new(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap();

    let gate = RoomGate::new(MemoryStore::new());
    assert_eq!(session.join(&gate).await.unwrap(), JoinOutcome::NoBootstrapPeers);

    let outcome = session.on_transport_event(TransportEvent::PeersConnected {
        topic: topic(),
        peers: peers(2),
    });
    assert_eq!(outcome, Some(JoinOutcome::Scheduled));

    // A second connection event while the batch is pending or done does
    // not produce another batch.
    assert_eq!(
        session.on_transport_event(TransportEvent::PeersConnected {
            topic: topic(),
            peers: peers(3),
        }),
        None
    );

    session.wait_for_bootstrap(&topic()).await.unwrap();
    assert_eq!(log.sync_requests(), 2);
}

#[tokio::test]
async fn permission_changes_notify_once_per_transition() {
    let notifier = RecordingNotifier::new();
    let me = peer(1);
    let transport = ScriptedTransport::new(me);

    let mut session = WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(KEY),
        MemoryStore::new(),
        transport,
        notifier.clone(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap();

    let mut membership = Membership::new();
    membership.insert(peer(2), "owner");
    session.observe_membership(&membership).await;

    for permission in ["viewer", "viewer", "editor", "owner", "owner"] {
        membership.insert(me, permission);
        session.observe_membership(&membership).await;
    }

    let severities: Vec<_> = notifier.notes().into_iter().map(|(_, s)| s).collect();
    assert_eq!(severities, vec![Severity::Info, Severity::Success]);
    assert_eq!(session.my_permission(), Some(Permission::Owner));
}

#[tokio::test]
async fn cached_permission_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weft.db");
    let me = peer(1);

    {
        let mut session = WorkspaceSession::open(
            workspace(),
            &KeyMaterial::from(KEY),
            SqliteStore::open(&path).unwrap(),
            ScriptedTransport::new(me),
            RecordingNotifier::new(),
            WorkspaceConfig::default(),
        )
        .await
        .unwrap();

        let mut membership = Membership::new();
        membership.insert(me, "editor");
        session.observe_membership(&membership).await;
        session.close();
    }

    let notifier = RecordingNotifier::new();
    let mut session = WorkspaceSession::open(
        workspace(),
        &KeyMaterial::from(KEY),
        SqliteStore::open(&path).unwrap(),
        ScriptedTransport::new(me),
        notifier.clone(),
        WorkspaceConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(session.my_permission(), Some(Permission::Editor));

    // First observation after restart updates silently.
    let mut membership = Membership::new();
    membership.insert(me, "viewer");
    session.observe_membership(&membership).await;
    assert_eq!(session.my_permission(), Some(Permission::Viewer));
    assert_eq!(notifier.count(), 0);
    assert_eq!(
        session
            .store()
            .read_workspace_state(&workspace())
            .await
            .unwrap()
            .and_then(|s| s.my_permission),
        Some(Permission::Viewer)
    );
}

#[tokio::test]
async fn memory_transport_exposes_local_peer() {
    let network = MemoryNetwork::new();
    let transport = network.create_transport(peer(4)).await;
    assert_eq!(transport.local_peer(), peer(4));
}
