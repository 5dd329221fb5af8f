//! The shared workspace key.
//!
//! Every authorized peer holds the same 32-byte secret. It is handed to the
//! client out-of-band, either as raw bytes or as base64 text, and is never
//! written to the network. Both types here wipe their buffers on drop.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CoreError, Result};

/// Length of a workspace key in bytes.
pub const KEY_LEN: usize = 32;

/// Key material as supplied by the caller, before validation.
pub enum KeyMaterial {
    /// Raw key bytes.
    Raw(Vec<u8>),
    /// Standard base64 encoding of the key bytes.
    Base64(String),
}

impl KeyMaterial {
    /// Normalize to raw bytes.
    ///
    /// Returns `None` when the material is empty or is not valid base64.
    pub fn normalize(&self) -> Option<Zeroizing<Vec<u8>>> {
        let bytes = match self {
            KeyMaterial::Raw(bytes) => Zeroizing::new(bytes.clone()),
            KeyMaterial::Base64(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Zeroizing::new(STANDARD.decode(trimmed).ok()?)
            }
        };

        if bytes.is_empty() {
            None
        } else {
            Some(bytes)
        }
    }

    /// Whether there is anything to normalize at all.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyMaterial::Raw(bytes) => bytes.is_empty(),
            KeyMaterial::Base64(text) => text.trim().is_empty(),
        }
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(bytes: &[u8]) -> Self {
        KeyMaterial::Raw(bytes.to_vec())
    }
}

impl From<[u8; KEY_LEN]> for KeyMaterial {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        KeyMaterial::Raw(bytes.to_vec())
    }
}

impl From<&str> for KeyMaterial {
    fn from(text: &str) -> Self {
        KeyMaterial::Base64(text.to_string())
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        match self {
            KeyMaterial::Raw(bytes) => bytes.zeroize(),
            KeyMaterial::Base64(text) => text.zeroize(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Raw(bytes) => write!(f, "KeyMaterial::Raw(<{} bytes>)", bytes.len()),
            KeyMaterial::Base64(_) => write!(f, "KeyMaterial::Base64(<redacted>)"),
        }
    }
}

/// A validated 32-byte workspace key.
///
/// Read-only after creation. Not `Clone` and not `Serialize`: the session
/// that opened the workspace owns it until close.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct WorkspaceKey([u8; KEY_LEN]);

impl WorkspaceKey {
    /// Create from exactly 32 raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Validate key material into a workspace key.
    pub fn from_material(material: &KeyMaterial) -> Result<Self> {
        if material.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        let bytes = material
            .normalize()
            .ok_or_else(|| CoreError::InvalidKeyEncoding("not valid base64".into()))?;
        Self::from_slice(&bytes)
    }

    /// Create from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CoreError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encode as standard base64, for handing to another member out-of-band.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for WorkspaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WorkspaceKey(<redacted>)")
    }
}
