//! Cryptographic primitives for govctl.
//!
//! - **Keccak-256** for function selectors, event topics, description hashes
//!   and proposal ids
//! - **secp256k1 ECDSA** with recoverable signatures for transaction signing
//! - Address derivation: last 20 bytes of Keccak-256 over the uncompressed public key

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::derive_address;
pub use error::CryptoError;
pub use hash::{keccak256, keccak256_multi, selector};
pub use keys::SecretKey;
pub use sign::{recover_address, sign_prehash, RecoverableSignature};
