//! EIP-155 legacy transactions.

use alloy_rlp::{Encodable, Header};
use govctl_crypto::{keccak256, RecoverableSignature};
use govctl_types::{Address, Bytes, TxHash, B256, U256};

/// An unsigned legacy transaction bound to a chain id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

impl LegacyTransaction {
    fn encode_common(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
    }

    /// `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_common(&mut payload);
        self.chain_id.encode(&mut payload);
        0u8.encode(&mut payload);
        0u8.encode(&mut payload);
        wrap_list(payload)
    }

    pub fn signing_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// `v` per EIP-155: `recovery_id + chain_id * 2 + 35`.
    pub fn v(&self, recovery_id: u8) -> u64 {
        u64::from(recovery_id) + self.chain_id * 2 + 35
    }

    /// Attach a signature over [`Self::signing_hash`].
    pub fn into_signed(self, signature: &RecoverableSignature) -> SignedTransaction {
        let mut payload = Vec::new();
        self.encode_common(&mut payload);
        self.v(signature.recovery_id).encode(&mut payload);
        signature.r.encode(&mut payload);
        signature.s.encode(&mut payload);
        let raw = wrap_list(payload);
        let hash = TxHash::from(keccak256(&raw));
        SignedTransaction { raw, hash }
    }
}

fn wrap_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}
