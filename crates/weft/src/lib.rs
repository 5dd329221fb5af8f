//! # Weft
//!
//! Client core for a peer-to-peer collaborative workspace.
//!
//! ## Overview
//!
//! Peers that share a 32-byte workspace key synchronize CRDT state through
//! a relay they only partially trust. This crate provides:
//!
//! - **Relay encryption**: everything the relay carries is sealed under the
//!   workspace key
//! - **Room authentication**: joining a room requires an HMAC token derived
//!   from the key; the relay keeps the first token it sees
//! - **Bootstrap sync**: a new peer asks its bootstrap peers for full state
//!   once connections settle
//! - **Permission reconciliation**: the locally cached permission follows the
//!   replicated membership record, and the user is told when it changes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use weft::{WorkspaceConfig, WorkspaceSession};
//! use weft::core::{KeyMaterial, PeerKey, WorkspaceId};
//! use weft::perms::TracingNotifier;
//! use weft::relay::RoomGate;
//! use weft::store::{MemoryStore, SqliteStore};
//! use weft::sync::MemoryNetwork;
//!
//! async fn example() {
//!     weft::logging::init("info");
//!
//!     let network = MemoryNetwork::new();
//!     let transport = network.create_transport(PeerKey::from_bytes([1; 32])).await;
//!     let store = SqliteStore::open("weft.db").unwrap();
//!
//!     let mut session = WorkspaceSession::open(
//!         WorkspaceId::new("my-workspace"),
//!         &KeyMaterial::from("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="),
//!         store,
//!         transport,
//!         TracingNotifier,
//!         WorkspaceConfig::default(),
//!     )
//!     .await
//!     .unwrap();
//!
//!     let relay = RoomGate::new(MemoryStore::new());
//!     session.join(&relay).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `weft::core` - Keys, identifiers and permissions
//! - `weft::store` - Storage abstraction and SQLite
//! - `weft::relay` - Envelope encryption and room tokens
//! - `weft::sync` - Bootstrap sync and transport
//! - `weft::perms` - Permission reconciliation

pub mod error;
pub mod logging;
pub mod session;

// Re-export component crates
pub use weft_core as core;
pub use weft_perms as perms;
pub use weft_relay as relay;
pub use weft_store as store;
pub use weft_sync as sync;

// Re-export main types for convenience
pub use error::{Result, WeftError};
pub use session::{Inbound, WorkspaceConfig, WorkspaceSession};

// Re-export commonly used types
pub use weft_core::{KeyMaterial, PeerKey, Permission, RoomToken, TopicHash, WorkspaceId, WorkspaceKey};
pub use weft_perms::{Membership, Notifier, Severity};
pub use weft_sync::{JoinOutcome, SyncMessage, SyncPhase, TransportEvent};
