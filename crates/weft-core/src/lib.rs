//! # Weft Core
//!
//! Pure types for the Weft workspace client: the shared workspace key, topic
//! and peer identifiers, room tokens and permission levels.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`WorkspaceKey`] - The 32-byte symmetric secret shared by all members
//! - [`KeyMaterial`] - A key as handed to us (raw bytes or base64 text)
//! - [`TopicHash`] - Identifier of a room/topic peers join to sync
//! - [`PeerKey`] - Transport identity of a peer
//! - [`RoomToken`] - Proof of key possession presented to the relay
//! - [`Permission`] - Owner, editor or viewer

pub mod crypto;
pub mod error;
pub mod key;
pub mod types;

pub use crypto::{Keypair, PeerKey};
pub use error::{CoreError, Result};
pub use key::{KeyMaterial, WorkspaceKey, KEY_LEN};
pub use types::{Permission, RoomToken, TopicHash, WorkspaceId};
