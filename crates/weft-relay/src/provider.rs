//! HMAC-SHA256 implementations.
//!
//! Token derivation tries these in order and uses the first that succeeds,
//! so the client keeps working on targets where one backend is missing.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{RelayError, Result};

/// Length of an HMAC-SHA256 digest.
pub const DIGEST_LEN: usize = 32;

/// One way of computing HMAC-SHA256.
pub trait HmacProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Compute `HMAC-SHA256(key, message)`.
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]>;
}

/// RustCrypto `hmac` over `sha2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoHmac;

impl HmacProvider for RustCryptoHmac {
    fn name(&self) -> &'static str {
        "rustcrypto"
    }

    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key).map_err(|e| {
            RelayError::Provider {
                provider: self.name(),
                reason: e.to_string(),
            }
        })?;
        mac.update(message);

        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}

/// `ring::hmac`.
#[cfg(feature = "ring")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RingHmac;

#[cfg(feature = "ring")]
impl HmacProvider for RingHmac {
    fn name(&self) -> &'static str {
        "ring"
    }

    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key);
        let tag = ring::hmac::sign(&key, message);

        let bytes = tag.as_ref();
        if bytes.len() != DIGEST_LEN {
            return Err(RelayError::Provider {
                provider: self.name(),
                reason: format!("unexpected digest length {}", bytes.len()),
            });
        }
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// RFC 2104 construction written directly over the SHA-256 digest.
///
/// Last resort; it depends on nothing but `sha2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestHmac;

impl DigestHmac {
    const BLOCK_LEN: usize = 64;
}

impl HmacProvider for DigestHmac {
    fn name(&self) -> &'static str {
        "digest"
    }

    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        let mut block_key = [0u8; Self::BLOCK_LEN];
        if key.len() > Self::BLOCK_LEN {
            block_key[..DIGEST_LEN].copy_from_slice(&Sha256::digest(key));
        } else {
            block_key[..key.len()].copy_from_slice(key);
        }

        let mut ipad = [0x36u8; Self::BLOCK_LEN];
        let mut opad = [0x5cu8; Self::BLOCK_LEN];
        for ((i, o), k) in ipad.iter_mut().zip(opad.iter_mut()).zip(block_key.iter()) {
            *i ^= k;
            *o ^= k;
        }

        let inner = Sha256::new().chain_update(ipad).chain_update(message).finalize();
        let outer = Sha256::new().chain_update(opad).chain_update(inner).finalize();

        block_key.zeroize();
        ipad.zeroize();
        opad.zeroize();

        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&outer);
        Ok(out)
    }
}

/// The providers in preference order for this build.
pub fn default_providers() -> Vec<Box<dyn HmacProvider>> {
    let mut providers: Vec<Box<dyn HmacProvider>> = vec![Box::new(RustCryptoHmac)];
    #[cfg(feature = "ring")]
    providers.push(Box::new(RingHmac));
    providers.push(Box::new(DigestHmac));
    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // RFC 4231 test case 2.
    const RFC4231_KEY: &[u8] = b"Jefe";
    const RFC4231_DATA: &[u8] = b"what do ya want for nothing?";
    const RFC4231_MAC: &str = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

    #[test]
    fn test_rfc4231_vector_all_providers() {
        for provider in default_providers() {
            let mac = provider.hmac_sha256(RFC4231_KEY, RFC4231_DATA).unwrap();
            assert_eq!(hex_string(&mac), RFC4231_MAC, "provider {}", provider.name());
        }
    }

    #[test]
    fn test_long_key_is_hashed() {
        let key = [0xaau8; 131];
        let expected = RustCryptoHmac.hmac_sha256(&key, b"msg").unwrap();
        assert_eq!(DigestHmac.hmac_sha256(&key, b"msg").unwrap(), expected);
    }

    #[test]
    fn test_default_order() {
        let names: Vec<_> = default_providers().iter().map(|p| p.name()).collect();
        assert_eq!(names.first(), Some(&"rustcrypto"));
        assert_eq!(names.last(), Some(&"digest"));
        #[cfg(feature = "ring")]
        assert_eq!(names, vec!["rustcrypto", "ring", "digest"]);
    }

    fn hex_string(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    proptest! {
        #[test]
        fn prop_providers_agree(
            key in proptest::collection::vec(any::<u8>(), 0..100),
            message in proptest::collection::vec(any::<u8>(), 0..200),
        ) {
            let providers = default_providers();
            let expected = providers[0].hmac_sha256(&key, &message).unwrap();
            for provider in &providers[1..] {
                prop_assert_eq!(provider.hmac_sha256(&key, &message).unwrap(), expected);
            }
        }
    }
}
