//! secp256k1 secret keys.

use govctl_types::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::address::derive_address;
use crate::error::CryptoError;

/// A secp256k1 signing key.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. `k256` zeroizes the scalar on drop.
pub struct SecretKey {
    inner: SigningKey,
}

impl SecretKey {
    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Load a key from its 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Load a key from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(
            hex::decode(s).map_err(|_| CryptoError::InvalidKey("invalid hex encoding".into()))?,
        );
        Self::from_bytes(&bytes)
    }

    /// The raw scalar, wrapped so the copy is wiped when dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.inner.to_bytes().into())
    }

    pub fn public_key(&self) -> &VerifyingKey {
        self.inner.verifying_key()
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Address {
        derive_address(self.public_key())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_key_derives_known_address() {
        let key = SecretKey::from_hex(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        let expected: Address = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23".parse().unwrap();
        assert_eq!(key.address(), expected);
    }

    #[test]
    fn bytes_roundtrip() {
        let key = SecretKey::generate();
        let restored = SecretKey::from_bytes(key.to_bytes().as_slice()).unwrap();
        assert_eq!(key.address(), restored.address());
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert!(SecretKey::from_bytes(&[1u8; 16]).is_err());
        assert!(SecretKey::from_hex("0xnothex").is_err());
        // Zero is not a valid scalar.
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(SecretKey::generate().address(), SecretKey::generate().address());
    }
}
