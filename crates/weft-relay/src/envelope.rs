//! Symmetric envelopes for payloads that pass through the relay.
//!
//! An envelope is `base64(nonce || ciphertext)`, where the nonce is 24 random
//! bytes and the ciphertext is XChaCha20-Poly1305 over the JSON encoding of
//! the payload (16-byte tag appended). The relay only ever sees this string.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use weft_core::{WorkspaceKey, KEY_LEN};
use zeroize::Zeroizing;

use crate::error::{RelayError, Result};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Smallest decodable envelope: a nonce and a tag over an empty plaintext.
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

/// Encrypt a payload, reporting why it failed.
pub fn try_seal<T: Serialize + ?Sized>(payload: &T, key: &[u8]) -> Result<String> {
    let cipher = cipher_for(key)?;

    let plaintext = Zeroizing::new(
        serde_json::to_vec(payload).map_err(|e| RelayError::Serialization(e.to_string()))?,
    );

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| RelayError::Encryption)?;

    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(framed))
}

/// Decrypt an envelope, reporting why it failed.
pub fn try_open<T: DeserializeOwned>(envelope: &str, key: &[u8]) -> Result<T> {
    let cipher = cipher_for(key)?;

    let framed = STANDARD
        .decode(envelope.trim())
        .map_err(|e| RelayError::MalformedEnvelope(e.to_string()))?;
    if framed.len() < MIN_ENVELOPE_LEN {
        return Err(RelayError::MalformedEnvelope(format!(
            "{} bytes is shorter than nonce and tag",
            framed.len()
        )));
    }

    let (nonce, ciphertext) = framed.split_at(NONCE_LEN);
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| RelayError::Authentication)?,
    );

    serde_json::from_slice(&plaintext).map_err(|e| RelayError::Serialization(e.to_string()))
}

/// Encrypt a payload for the relay.
///
/// Returns `None` when the key is not 32 bytes or the payload cannot be
/// serialized.
pub fn seal<T: Serialize + ?Sized>(payload: &T, key: &[u8]) -> Option<String> {
    match try_seal(payload, key) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            tracing::warn!(error = %e, "failed to seal relay envelope");
            None
        }
    }
}

/// Decrypt an envelope received from the relay.
///
/// Returns `None` for a wrong key, tampered or truncated data, bad base64 or
/// a plaintext that is not the expected JSON. Any of these can happen in
/// normal operation, so they are logged at debug level only.
pub fn open<T: DeserializeOwned>(envelope: &str, key: &[u8]) -> Option<T> {
    match try_open(envelope, key) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "discarding relay envelope");
            None
        }
    }
}

fn cipher_for(key: &[u8]) -> Result<XChaCha20Poly1305> {
    if key.len() != KEY_LEN {
        return Err(RelayError::InvalidKeyLength(key.len()));
    }
    XChaCha20Poly1305::new_from_slice(key).map_err(|_| RelayError::InvalidKeyLength(key.len()))
}

/// Envelope cipher bound to one workspace key.
pub struct RelayCipher {
    key: WorkspaceKey,
}

impl RelayCipher {
    /// Bind a cipher to a workspace key.
    pub fn new(key: WorkspaceKey) -> Self {
        Self { key }
    }

    /// The workspace key this cipher uses.
    pub fn key(&self) -> &WorkspaceKey {
        &self.key
    }

    /// Seal a payload under the bound key.
    pub fn seal<T: Serialize + ?Sized>(&self, payload: &T) -> Option<String> {
        seal(payload, self.key.as_bytes())
    }

    /// Open an envelope under the bound key.
    pub fn open<T: DeserializeOwned>(&self, envelope: &str) -> Option<T> {
        open(envelope, self.key.as_bytes())
    }
}

impl std::fmt::Debug for RelayCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCipher").finish_non_exhaustive()
    }
}
