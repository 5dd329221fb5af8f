//! # Weft Permissions
//!
//! Keeps this peer's cached permission level consistent with the
//! collaboratively replicated membership record.
//!
//! ## Overview
//!
//! The membership record maps each peer key to a permission (`owner`,
//! `editor` or `viewer`). It is authoritative: the local cache is overwritten
//! whenever they disagree, and the user is told when their access changes.
//!
//! ```rust,no_run
//! use weft_core::{PeerKey, WorkspaceId};
//! use weft_perms::{Membership, PermissionReconciler, TracingNotifier};
//! use weft_store::MemoryStore;
//!
//! async fn example() {
//!     let me = PeerKey::from_bytes([1; 32]);
//!     let mut reconciler =
//!         PermissionReconciler::new(WorkspaceId::new("ws"), me, MemoryStore::new(), TracingNotifier);
//!     reconciler.load().await.unwrap();
//!
//!     let mut membership = Membership::new();
//!     membership.insert(me, "editor");
//!     reconciler.observe(&membership).await;
//! }
//! ```

pub mod error;
pub mod membership;
pub mod notify;
pub mod reconciler;

pub use error::{PermsError, Result};
pub use membership::{MemberRecord, Membership};
pub use notify::{notification_for, Notifier, Severity, TracingNotifier};
pub use reconciler::{run, LocalPermissionSnapshot, PermissionReconciler, Reconciled};
