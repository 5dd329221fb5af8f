//! Relay-side admission: first token presented for a room wins.

use async_trait::async_trait;
use weft_core::RoomToken;
use weft_store::{Registration, Store};

use crate::error::{RelayError, Result};
use crate::token::is_well_formed;

/// Outcome of an admitted join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The room had no registration; this token now owns it.
    Registered,
    /// The token matched the existing registration.
    Admitted,
}

/// Anything that can admit or reject a join for a room.
///
/// Clients call this through whatever connection they hold to the relay;
/// [`RoomGate`] is the relay's own implementation.
#[async_trait]
pub trait RelayAdmission: Send + Sync {
    /// Present `token` for `room`.
    async fn admit(&self, room: &str, token: &RoomToken) -> Result<Admission>;
}

/// Room registry backed by a [`Store`].
///
/// The check-and-set is delegated to [`Store::register_room`], which is
/// atomic, so concurrent first joins with different tokens produce exactly
/// one registration.
pub struct RoomGate<S> {
    store: S,
}

impl<S: Store> RoomGate<S> {
    /// Create a gate over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: Store> RelayAdmission for RoomGate<S> {
    async fn admit(&self, room: &str, token: &RoomToken) -> Result<Admission> {
        if room.is_empty() {
            return Err(RelayError::InvalidInput("room id is empty".into()));
        }
        // Garbage must not be able to claim an unregistered room.
        if !is_well_formed(token) {
            tracing::warn!(room, "rejected join: malformed token");
            return Err(RelayError::MalformedToken);
        }

        match self.store.register_room(room, token).await? {
            Registration::Registered => {
                tracing::info!(room, "registered room token");
                Ok(Admission::Registered)
            }
            Registration::Matched => Ok(Admission::Admitted),
            Registration::Mismatch => {
                tracing::warn!(room, "rejected join: token does not match registration");
                Err(RelayError::AuthenticationRejected {
                    room: room.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl<A: RelayAdmission + ?Sized> RelayAdmission for std::sync::Arc<A> {
    async fn admit(&self, room: &str, token: &RoomToken) -> Result<Admission> {
        (**self).admit(room, token).await
    }
}
