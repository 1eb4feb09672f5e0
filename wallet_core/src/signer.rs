//! The account that signs orchestrator transactions.

use govctl_crypto::{sign_prehash, SecretKey};
use govctl_types::Address;
use std::fmt;
use std::path::Path;

use crate::error::WalletError;
use crate::keystore::{decrypt_keystore, load_keystore};
use crate::transaction::{LegacyTransaction, SignedTransaction};

/// A loaded signing key and the address it controls.
///
/// `Debug` prints only the address.
pub struct Signer {
    key: SecretKey,
    address: Address,
}

impl Signer {
    pub fn new(key: SecretKey) -> Self {
        let address = key.address();
        Self { key, address }
    }

    /// From a hex private key, with or without `0x`.
    pub fn from_private_key(hex_key: &str) -> Result<Self, WalletError> {
        Ok(Self::new(SecretKey::from_hex(hex_key)?))
    }

    /// From an encrypted keystore file.
    pub fn from_keystore(path: &Path, password: &str) -> Result<Self, WalletError> {
        let keystore = load_keystore(path)?;
        let signer = Self::new(decrypt_keystore(&keystore, password)?);
        tracing::debug!(address = %signer.address, path = %path.display(), "keystore unlocked");
        Ok(signer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.key
    }

    pub fn sign_transaction(&self, tx: LegacyTransaction) -> Result<SignedTransaction, WalletError> {
        let signature = sign_prehash(&tx.signing_hash(), &self.key)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx.into_signed(&signature))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{encrypt_keystore, save_keystore};
    use govctl_crypto::recover_address;
    use govctl_types::{Bytes, U256};

    const HARDHAT_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn private_key_address() {
        let signer = Signer::from_private_key(HARDHAT_0).unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(signer.address(), expected);
        assert!(!format!("{signer:?}").contains("ac0974"));
    }

    #[test]
    fn bad_private_key_is_rejected() {
        assert!(Signer::from_private_key("0x1234").is_err());
    }

    #[test]
    fn keystore_signer_matches_raw_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ks.json");
        let raw = Signer::from_private_key(HARDHAT_0).unwrap();
        save_keystore(&encrypt_keystore(raw.secret_key(), "pw").unwrap(), &path).unwrap();

        let unlocked = Signer::from_keystore(&path, "pw").unwrap();
        assert_eq!(unlocked.address(), raw.address());
    }

    #[test]
    fn signed_transaction_recovers_signer() {
        let signer = Signer::from_private_key(HARDHAT_0).unwrap();
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::from(1_000_000_000u64),
            gas_limit: 100_000,
            to: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".parse().unwrap(),
            value: U256::ZERO,
            data: Bytes::from(vec![1, 2, 3]),
            chain_id: 31337,
        };
        let hash = tx.signing_hash();
        let signed = signer.sign_transaction(tx).unwrap();
        assert!(!signed.hash.is_zero());

        let sig = sign_prehash(&hash, signer.secret_key()).unwrap();
        assert_eq!(recover_address(&hash, &sig).unwrap(), signer.address());
    }
}
