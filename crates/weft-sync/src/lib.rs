//! # Weft Sync
//!
//! Bootstrap synchronization for a workspace topic.
//!
//! ## Overview
//!
//! Document state itself is merged by an external CRDT layer whose merge is
//! commutative and idempotent. This crate only makes sure a newly joined
//! peer asks its bootstrap peers for full state once connections settle, and
//! defines the messages and transport seam for that exchange.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weft_core::{PeerKey, TopicHash, WorkspaceId};
//! use weft_sync::{BootstrapConfig, BootstrapCoordinator, MemoryNetwork, Transport};
//!
//! async fn example() {
//!     let network = MemoryNetwork::new();
//!     let transport = Arc::new(network.create_transport(PeerKey::from_bytes([1; 32])).await);
//!     let topic = TopicHash::derive(&WorkspaceId::new("ws"));
//!
//!     let mut coordinator = BootstrapCoordinator::new(transport.clone(), BootstrapConfig::default());
//!     let peers = transport.bootstrap_peers(&topic).await.unwrap_or_default();
//!     coordinator.join(topic, peers);
//!     let _report = coordinator.wait(&topic).await;
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Joiner                              Bootstrap peer
//!   | (settle delay)                   |
//!   |-------- sync-request ----------->|
//!   |<------- update (full state) -----|
//!   |<------- update ------------------|   (incremental, either direction)
//! ```

pub mod coordinator;
pub mod error;
pub mod messages;
pub mod transport;

pub use coordinator::{
    request_sync, BootstrapConfig, BootstrapCoordinator, JoinOutcome, PeerFailure,
    SyncBatchReport, SyncPhase, DEFAULT_SETTLE_DELAY,
};
pub use error::{Result, SyncError};
pub use messages::{limits, SyncMessage};
pub use transport::{memory::MemoryNetwork, memory::MemoryTransport, Transport, TransportEvent};
