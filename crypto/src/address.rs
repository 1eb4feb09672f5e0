//! Account address derivation from secp256k1 public keys.

use govctl_types::Address;
use k256::ecdsa::VerifyingKey;

use crate::hash::keccak256;

/// Derive the account address: the last 20 bytes of Keccak-256 over the
/// 64-byte uncompressed public key (without the `0x04` tag).
pub fn derive_address(public_key: &VerifyingKey) -> Address {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;

    #[test]
    fn well_known_development_account() {
        let key =
            SecretKey::from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap();
        let expected: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(derive_address(key.public_key()), expected);
        assert_eq!(key.address(), expected);
    }
}
