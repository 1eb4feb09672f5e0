//! Proposal identifier.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A Governor proposal identifier: `uint256(keccak256(abi.encode(...)))`.
///
/// Displayed in decimal, which is how the Governor's events render it and
/// how users copy it around. Parsing accepts decimal or `0x`-prefixed hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(U256);

impl ProposalId {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Interpret a 32-byte digest as a big-endian uint256.
    pub fn from_digest(digest: B256) -> Self {
        Self(U256::from_be_bytes(digest.0))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for ProposalId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypesError::InvalidProposalId {
                input: s.to_string(),
                reason: "empty".into(),
            });
        }
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(trimmed, 10),
        };
        parsed
            .map(Self)
            .map_err(|e| TypesError::InvalidProposalId {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<U256> for ProposalId {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
