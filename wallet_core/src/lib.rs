//! Signing account for govctl.
//!
//! - [`Signer`]: a secp256k1 key loaded from hex or from an encrypted keystore
//! - [`LegacyTransaction`]: EIP-155 transaction encoding and signing
//! - [`keystore`]: Argon2id + AES-256-GCM key files

pub mod error;
pub mod keystore;
pub mod signer;
pub mod transaction;

pub use error::WalletError;
pub use keystore::{decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, KeystoreFile};
pub use signer::Signer;
pub use transaction::{LegacyTransaction, SignedTransaction};
