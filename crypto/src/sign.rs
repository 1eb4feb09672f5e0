//! Recoverable ECDSA signing over 32-byte prehashes.

use govctl_types::{Address, B256, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::address::derive_address;
use crate::error::CryptoError;
use crate::keys::SecretKey;

/// An ECDSA signature with its recovery id (`0` or `1`), low-S normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: U256,
    pub s: U256,
    pub recovery_id: u8,
}

/// Sign a 32-byte message hash.
pub fn sign_prehash(hash: &B256, key: &SecretKey) -> Result<RecoverableSignature, CryptoError> {
    let (signature, recovery_id) = key
        .signing_key()
        .sign_prehash_recoverable(hash.as_slice())
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let bytes = signature.to_bytes();
    Ok(RecoverableSignature {
        r: U256::from_be_slice(&bytes[..32]),
        s: U256::from_be_slice(&bytes[32..]),
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the signer's address from a message hash and signature.
pub fn recover_address(hash: &B256, signature: &RecoverableSignature) -> Result<Address, CryptoError> {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(&signature.r.to_be_bytes::<32>());
    bytes[32..].copy_from_slice(&signature.s.to_be_bytes::<32>());
    let sig = Signature::from_slice(&bytes)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
        CryptoError::InvalidSignature(format!("recovery id {}", signature.recovery_id))
    })?;
    let public_key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(derive_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;

    #[test]
    fn sign_and_recover() {
        let key = SecretKey::generate();
        let hash = keccak256(b"govctl test message");
        let sig = sign_prehash(&hash, &key).unwrap();
        assert!(sig.recovery_id <= 1);
        assert_eq!(recover_address(&hash, &sig).unwrap(), key.address());
    }

    #[test]
    fn wrong_message_recovers_other_address() {
        let key = SecretKey::generate();
        let sig = sign_prehash(&keccak256(b"correct"), &key).unwrap();
        let recovered = recover_address(&keccak256(b"wrong"), &sig).unwrap();
        assert_ne!(recovered, key.address());
    }

    #[test]
    fn signature_is_deterministic() {
        let key = SecretKey::from_bytes(&[7u8; 32]).unwrap();
        let hash = keccak256(b"deterministic");
        assert_eq!(sign_prehash(&hash, &key).unwrap(), sign_prehash(&hash, &key).unwrap());
    }

    #[test]
    fn s_is_low() {
        // secp256k1 n / 2
        let half_n = U256::from_str_radix(
            "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0",
            16,
        )
        .unwrap();
        let key = SecretKey::generate();
        for i in 0u8..8 {
            let sig = sign_prehash(&keccak256([i]), &key).unwrap();
            assert!(sig.s <= half_n);
        }
    }
}
