//! # Weft Testkit
//!
//! Testing utilities for the Weft workspace client.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Room tokens with known values for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Recording notifier, scripted transport and deterministic peers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use weft_relay::RoomAuthenticator;
//! use weft_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors(&RoomAuthenticator::default()).is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use weft_testkit::generators::{json_value, workspace_key};
//!
//! proptest! {
//!     #[test]
//!     fn roundtrip(key in workspace_key(), payload in json_value()) {
//!         let sealed = weft_relay::seal(&payload, key.as_bytes()).unwrap();
//!         prop_assert_eq!(weft_relay::open(&sealed, key.as_bytes()), Some(payload));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use weft_testkit::fixtures::{peers, ScriptedTransport};
//! use weft_core::TopicHash;
//!
//! let topic = TopicHash::from_bytes([7; 32]);
//! let transport = ScriptedTransport::new(peers(1)[0]).with_bootstrap(topic, peers(3));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{peer, peers, RecordingNotifier, ScriptedTransport, SentLog};
pub use vectors::{all_vectors, verify_all_vectors, GoldenToken};
