//! SQLite implementation of the Store trait.
//!
//! This is the persistent backend. It uses rusqlite with bundled SQLite; the
//! connection sits behind a mutex and every statement is short.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use weft_core::{Permission, RoomToken, WorkspaceId};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{Registration, Store, WorkspaceState};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn read_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<WorkspaceState>> {
        self.with_conn(|conn| {
            let row: Option<Option<String>> = conn
                .query_row(
                    "SELECT my_permission FROM workspace_state WHERE workspace_id = ?1",
                    params![workspace_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(stored) = row else {
                return Ok(None);
            };
            let my_permission = stored.as_deref().and_then(|text| {
                let permission = Permission::parse(text);
                if permission.is_none() {
                    tracing::warn!(
                        workspace = %workspace_id,
                        value = text,
                        "ignoring unrecognized cached permission"
                    );
                }
                permission
            });
            Ok(Some(WorkspaceState { my_permission }))
        })
    }

    async fn write_workspace_state(
        &self,
        workspace_id: &WorkspaceId,
        state: &WorkspaceState,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO workspace_state (workspace_id, my_permission, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(workspace_id) DO UPDATE SET
                    my_permission = excluded.my_permission,
                    updated_at = excluded.updated_at",
                params![
                    workspace_id.as_str(),
                    state.my_permission.map(|p| p.as_str()),
                    now_millis()
                ],
            )?;
            Ok(())
        })
    }

    async fn register_room(&self, room: &str, token: &RoomToken) -> Result<Registration> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO room_registrations (room_id, token, registered_at)
                 VALUES (?1, ?2, ?3)",
                params![room, token.as_str(), now_millis()],
            )?;

            let outcome = if inserted == 1 {
                Registration::Registered
            } else {
                let existing: String = tx.query_row(
                    "SELECT token FROM room_registrations WHERE room_id = ?1",
                    params![room],
                    |row| row.get(0),
                )?;
                if existing.as_bytes() == token.as_str().as_bytes() {
                    Registration::Matched
                } else {
                    Registration::Mismatch
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    async fn room_registration(&self, room: &str) -> Result<Option<RoomToken>> {
        self.with_conn(|conn| {
            let token: Option<String> = conn
                .query_row(
                    "SELECT token FROM room_registrations WHERE room_id = ?1",
                    params![room],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(token.map(RoomToken::new))
        })
    }

    async fn clear_room_registration(&self, room: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM room_registrations WHERE room_id = ?1",
                params![room],
            )?;
            Ok(removed > 0)
        })
    }
}
