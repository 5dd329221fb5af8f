//! # Weft Store
//!
//! Storage abstraction for the Weft workspace client. Holds the two pieces of
//! state this core persists:
//!
//! - the locally cached permission of each workspace (`my_permission`), and
//! - the relay-side room registrations (first token seen per room).
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Registration`] - Outcome of a room registration attempt
//!
//! ## Usage
//!
//! ```rust,no_run
//! use weft_core::{Permission, WorkspaceId};
//! use weft_store::{SqliteStore, Store, WorkspaceState};
//!
//! async fn example() {
//!     let store = SqliteStore::open("weft.db").unwrap();
//!     let id = WorkspaceId::new("design-notes");
//!
//!     store
//!         .write_workspace_state(&id, &WorkspaceState::with_permission(Permission::Editor))
//!         .await
//!         .unwrap();
//!
//!     let state = store.read_workspace_state(&id).await.unwrap();
//!     assert_eq!(state.unwrap().my_permission, Some(Permission::Editor));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **First write wins**: `register_room` is an atomic check-and-set. The
//!   first token stored for a room stays until cleared out-of-band.
//! - **Single field**: the core writes only `my_permission`.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Registration, Store, WorkspaceState};
