//! Room authentication tokens.
//!
//! A token proves knowledge of the workspace key without revealing it:
//!
//! ```text
//! token = base64(HMAC-SHA256(key, "room-auth:" || topic))
//! ```
//!
//! Every peer holding the same key derives the same token for a topic, and
//! the relay only compares tokens byte-for-byte.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use weft_core::{KeyMaterial, RoomToken, TopicHash, WorkspaceKey};

use crate::error::{RelayError, Result};
use crate::provider::{default_providers, HmacProvider, DIGEST_LEN};

/// Domain-separation prefix for the MAC input.
pub const TOKEN_PREFIX: &str = "room-auth:";

/// Derives room tokens through an ordered chain of HMAC providers.
pub struct RoomAuthenticator {
    providers: Vec<Box<dyn HmacProvider>>,
}

impl RoomAuthenticator {
    /// Build an authenticator with an explicit provider chain.
    pub fn new(providers: Vec<Box<dyn HmacProvider>>) -> Self {
        Self { providers }
    }

    /// Names of the configured providers, in the order they are tried.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Derive the token for `topic`.
    ///
    /// Returns `None` when the key or topic is empty or the key text is not
    /// valid base64, and when no provider could compute the MAC.
    pub fn derive_token(&self, key: &KeyMaterial, topic: &str) -> Option<RoomToken> {
        match self.try_derive_token(key, topic) {
            Ok(token) => Some(token),
            Err(RelayError::NoProvider) => None,
            Err(e) => {
                tracing::debug!(error = %e, "room token not derived");
                None
            }
        }
    }

    /// Derive the token for `topic`, reporting why it failed.
    pub fn try_derive_token(&self, key: &KeyMaterial, topic: &str) -> Result<RoomToken> {
        let key = key.normalize().ok_or_else(|| {
            RelayError::InvalidInput("workspace key is empty or not valid base64".into())
        })?;
        self.derive_from_bytes(&key, topic)
    }

    /// Derive the token for a workspace topic.
    pub fn token_for_topic(&self, key: &WorkspaceKey, topic: &TopicHash) -> Option<RoomToken> {
        match self.derive_from_bytes(key.as_bytes(), &topic.to_hex()) {
            Ok(token) => Some(token),
            Err(RelayError::NoProvider) => None,
            Err(e) => {
                tracing::debug!(error = %e, %topic, "room token not derived");
                None
            }
        }
    }

    fn derive_from_bytes(&self, key: &[u8], topic: &str) -> Result<RoomToken> {
        if key.is_empty() {
            return Err(RelayError::InvalidInput("workspace key is empty".into()));
        }
        if topic.is_empty() {
            return Err(RelayError::InvalidInput("topic is empty".into()));
        }

        let mut message = Vec::with_capacity(TOKEN_PREFIX.len() + topic.len());
        message.extend_from_slice(TOKEN_PREFIX.as_bytes());
        message.extend_from_slice(topic.as_bytes());

        let digest = self.mac(key, &message)?;
        Ok(RoomToken::new(STANDARD.encode(digest)))
    }

    fn mac(&self, key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        for provider in &self.providers {
            match provider.hmac_sha256(key, message) {
                Ok(digest) => return Ok(digest),
                Err(e) => {
                    tracing::debug!(provider = provider.name(), error = %e, "hmac provider failed, trying next");
                }
            }
        }
        tracing::error!(
            tried = self.providers.len(),
            "no HMAC-SHA256 implementation available; cannot authenticate to relay"
        );
        Err(RelayError::NoProvider)
    }
}

impl Default for RoomAuthenticator {
    fn default() -> Self {
        Self::new(default_providers())
    }
}

impl std::fmt::Debug for RoomAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomAuthenticator")
            .field("providers", &self.provider_names())
            .finish()
    }
}

/// Check that a presented token has the shape of a derived token.
pub fn is_well_formed(token: &RoomToken) -> bool {
    token.as_str().len() == RoomToken::ENCODED_LEN
        && STANDARD
            .decode(token.as_str())
            .map(|bytes| bytes.len() == DIGEST_LEN)
            .unwrap_or(false)
}
