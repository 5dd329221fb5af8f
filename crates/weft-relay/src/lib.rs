//! # Weft Relay
//!
//! Everything that touches the untrusted relay.
//!
//! ## Envelopes
//!
//! Payloads that transit the relay are sealed with XChaCha20-Poly1305 under
//! the 32-byte workspace key and carried as `base64(nonce || ciphertext)`.
//! See [`envelope`].
//!
//! ## Room Tokens
//!
//! Joining a room requires a token that proves knowledge of the workspace
//! key. [`RoomAuthenticator`] derives it with HMAC-SHA256 through a chain of
//! [`HmacProvider`]s, and [`RoomGate`] is the relay-side registry that
//! accepts the first token it sees for a room and compares every later one
//! against it.
//!
//! ```rust,no_run
//! use weft_core::KeyMaterial;
//! use weft_relay::{envelope, RoomAuthenticator};
//!
//! let key = [0u8; 32];
//! let token = RoomAuthenticator::default().derive_token(&KeyMaterial::from(key), "room1");
//! let sealed = envelope::seal(&serde_json::json!({"a": 1}), &key);
//! ```

pub mod envelope;
pub mod error;
pub mod gate;
pub mod provider;
pub mod token;

pub use envelope::{open, seal, try_open, try_seal, RelayCipher, NONCE_LEN, TAG_LEN};
pub use error::{RelayError, Result};
pub use gate::{Admission, RelayAdmission, RoomGate};
#[cfg(feature = "ring")]
pub use provider::RingHmac;
pub use provider::{default_providers, DigestHmac, HmacProvider, RustCryptoHmac};
pub use token::{is_well_formed, RoomAuthenticator, TOKEN_PREFIX};
