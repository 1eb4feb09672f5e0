//! Proposal identity: the exact call tuple and description a proposal is
//! created with, and the two hashes derived from it.
//!
//! The Governor never stores the call parameters in a way that can be read
//! back, so proposer and executor must derive them identically. Everything
//! here is pure.

use govctl_abi::{encode, Token};
use govctl_crypto::keccak256;
use govctl_types::{Address, Bytes, ProposalId, TokenAmount, B256, U256};
use serde::{Deserialize, Serialize};

use crate::contract::{governor, token};
use crate::error::GovernanceError;

/// Description of the demo proposal created by `propose` with no manifest.
pub const WELL_KNOWN_DESCRIPTION: &str = "Proposal #1: Mint 100 tokens to the proposer";

/// Whole tokens minted by the demo proposal.
pub const WELL_KNOWN_MINT_WHOLE: u64 = 100;

/// One call executed by a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCall {
    pub target: Address,
    pub value: U256,
    pub calldata: Bytes,
}

impl ProposalCall {
    pub fn new(target: Address, value: U256, calldata: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            calldata: calldata.into(),
        }
    }
}

/// The immutable tuple that identifies a proposal on the Governor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalIdentity {
    calls: Vec<ProposalCall>,
    description: String,
}

impl ProposalIdentity {
    pub fn new(
        calls: Vec<ProposalCall>,
        description: impl Into<String>,
    ) -> Result<Self, GovernanceError> {
        if calls.is_empty() {
            return Err(GovernanceError::InvalidIdentity(
                "a proposal needs at least one call".to_string(),
            ));
        }
        Ok(Self {
            calls,
            description: description.into(),
        })
    }

    /// Build from the Governor's parallel-array form.
    pub fn from_parts(
        targets: Vec<Address>,
        values: Vec<U256>,
        calldatas: Vec<Bytes>,
        description: impl Into<String>,
    ) -> Result<Self, GovernanceError> {
        if targets.len() != values.len() || targets.len() != calldatas.len() {
            return Err(GovernanceError::InvalidIdentity(format!(
                "length mismatch: {} targets, {} values, {} calldatas",
                targets.len(),
                values.len(),
                calldatas.len()
            )));
        }
        let calls = targets
            .into_iter()
            .zip(values)
            .zip(calldatas)
            .map(|((target, value), calldata)| ProposalCall {
                target,
                value,
                calldata,
            })
            .collect();
        Self::new(calls, description)
    }

    /// The demo proposal: mint 100 tokens on `token` to `recipient`.
    pub fn well_known(token: Address, recipient: Address) -> Result<Self, GovernanceError> {
        let calldata = token::mint(recipient, TokenAmount::from_whole(WELL_KNOWN_MINT_WHOLE))?;
        Self::new(
            vec![ProposalCall::new(token, U256::ZERO, calldata)],
            WELL_KNOWN_DESCRIPTION,
        )
    }

    pub fn calls(&self) -> &[ProposalCall] {
        &self.calls
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn targets(&self) -> Vec<Address> {
        self.calls.iter().map(|c| c.target).collect()
    }

    pub fn values(&self) -> Vec<U256> {
        self.calls.iter().map(|c| c.value).collect()
    }

    pub fn calldatas(&self) -> Vec<Bytes> {
        self.calls.iter().map(|c| c.calldata.clone()).collect()
    }

    /// `keccak256(utf8(description))`, the Governor's `descriptionHash`.
    pub fn fingerprint(&self) -> B256 {
        keccak256(self.description.as_bytes())
    }

    /// `uint256(keccak256(abi.encode(targets, values, calldatas, descriptionHash)))`.
    pub fn proposal_id(&self) -> ProposalId {
        let [targets, values, calldatas] = self.array_tokens();
        let encoded = encode(&[
            targets,
            values,
            calldatas,
            Token::FixedBytes(self.fingerprint().to_vec()),
        ]);
        ProposalId::from_digest(keccak256(&encoded))
    }

    /// Calldata for `Governor.propose(targets, values, calldatas, description)`.
    pub fn propose_calldata(&self) -> Result<Vec<u8>, GovernanceError> {
        let [targets, values, calldatas] = self.array_tokens();
        Ok(governor::propose().encode_input(&[
            targets,
            values,
            calldatas,
            Token::String(self.description.clone()),
        ])?)
    }

    /// Calldata for `Governor.execute(targets, values, calldatas, descriptionHash)`.
    pub fn execute_calldata(&self) -> Result<Vec<u8>, GovernanceError> {
        let [targets, values, calldatas] = self.array_tokens();
        Ok(governor::execute().encode_input(&[
            targets,
            values,
            calldatas,
            Token::FixedBytes(self.fingerprint().to_vec()),
        ])?)
    }

    fn array_tokens(&self) -> [Token; 3] {
        [
            Token::Array(self.calls.iter().map(|c| Token::Address(c.target)).collect()),
            Token::Array(self.calls.iter().map(|c| Token::Uint(c.value)).collect()),
            Token::Array(
                self.calls
                    .iter()
                    .map(|c| Token::Bytes(c.calldata.to_vec()))
                    .collect(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_addr() -> Address {
        "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
    }

    fn recipient() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    #[test]
    fn fingerprint_matches_keccak_of_description() {
        let identity = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        assert_eq!(
            identity.fingerprint(),
            keccak256(WELL_KNOWN_DESCRIPTION.as_bytes())
        );
    }

    #[test]
    fn well_known_vectors() {
        let identity = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        assert_eq!(
            identity.fingerprint().to_string(),
            "0x43e2d54fe24855b520e91084d5eb2e36e4409ff3cba6adeaee9dd0a4639b0677"
        );
        assert_eq!(
            identity.proposal_id().to_string(),
            "33349865468286497692711039254976326758201369504081759139990195789782450777158"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        let b = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.proposal_id(), b.proposal_id());
        assert_eq!(a.execute_calldata().unwrap(), b.execute_calldata().unwrap());
    }

    #[test]
    fn description_change_changes_identity() {
        let a = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        let b = ProposalIdentity::new(a.calls().to_vec(), "Proposal #2: Mint 100 tokens to the proposer")
            .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.proposal_id(), b.proposal_id());
    }

    #[test]
    fn recipient_change_changes_id_not_fingerprint() {
        let other: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let a = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        let b = ProposalIdentity::well_known(token_addr(), other).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.proposal_id(), b.proposal_id());
    }

    #[test]
    fn well_known_shape() {
        let identity = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        assert_eq!(identity.targets(), vec![token_addr()]);
        assert_eq!(identity.values(), vec![U256::ZERO]);
        let calldata = &identity.calldatas()[0];
        assert_eq!(calldata.len(), 68);
        assert_eq!(hex::encode(&calldata[..4]), "40c10f19");
    }

    #[test]
    fn parallel_arrays_must_agree() {
        let err = ProposalIdentity::from_parts(
            vec![token_addr(), token_addr()],
            vec![U256::ZERO],
            vec![Bytes::new(), Bytes::new()],
            "x",
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidIdentity(_)));

        let err = ProposalIdentity::new(vec![], "x").unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidIdentity(_)));
    }

    #[test]
    fn execute_calldata_layout() {
        let identity = ProposalIdentity::well_known(token_addr(), recipient()).unwrap();
        let data = identity.execute_calldata().unwrap();
        assert_eq!(hex::encode(&data[..4]), "2656227d");
        // The fourth head word is the inline descriptionHash.
        assert_eq!(&data[4 + 96..4 + 128], identity.fingerprint().as_slice());
    }
}
