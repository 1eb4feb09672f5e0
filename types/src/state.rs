//! Lifecycle state and vote enums as reported by the Governor contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// The lifecycle state of a proposal, as returned by `Governor.state(uint256)`.
///
/// The discriminants are the on-chain ordinals. Decoding from a raw ordinal
/// goes through [`ProposalState::try_from`], which rejects anything outside
/// `0..=7` instead of mapping it to a catch-all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProposalState {
    /// Created; the voting delay has not elapsed yet.
    Pending = 0,
    /// Inside the voting window.
    Active = 1,
    /// Canceled by the proposer or a guardian.
    Canceled = 2,
    /// Voting ended without quorum or majority.
    Defeated = 3,
    /// Voting ended and the proposal passed.
    Succeeded = 4,
    /// Passed and queued in a timelock.
    Queued = 5,
    /// Queued but the execution grace period lapsed.
    Expired = 6,
    /// Executed on-chain.
    Executed = 7,
}

impl ProposalState {
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Active,
        Self::Canceled,
        Self::Defeated,
        Self::Succeeded,
        Self::Queued,
        Self::Expired,
        Self::Executed,
    ];

    /// The on-chain ordinal.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Canceled => "Canceled",
            Self::Defeated => "Defeated",
            Self::Succeeded => "Succeeded",
            Self::Queued => "Queued",
            Self::Expired => "Expired",
            Self::Executed => "Executed",
        }
    }

    /// States from which no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Defeated | Self::Expired | Self::Executed
        )
    }

    /// Whether the Governor exposes a voting window for this state.
    ///
    /// Snapshot and deadline exist from creation, but until the voting delay
    /// elapses they are not meaningful to a voter.
    pub fn has_voting_window(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<u8> for ProposalState {
    type Error = TypesError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(ordinal as usize)
            .copied()
            .ok_or(TypesError::UnknownProposalState(ordinal))
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state reading as observed on the ledger.
///
/// The Governor's enum may grow in later contract versions. A reading that
/// does not decode stays `Unrecognized` so the decision engine can refuse it
/// explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservedState {
    Known(ProposalState),
    Unrecognized(u8),
}

impl ObservedState {
    pub fn known(&self) -> Option<ProposalState> {
        match self {
            Self::Known(state) => Some(*state),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Known(state) => state.ordinal(),
            Self::Unrecognized(ordinal) => *ordinal,
        }
    }
}

impl From<u8> for ObservedState {
    fn from(ordinal: u8) -> Self {
        match ProposalState::try_from(ordinal) {
            Ok(state) => Self::Known(state),
            Err(_) => Self::Unrecognized(ordinal),
        }
    }
}

impl From<ProposalState> for ObservedState {
    fn from(state: ProposalState) -> Self {
        Self::Known(state)
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(state) => write!(f, "{state}"),
            Self::Unrecognized(ordinal) => write!(f, "Unknown({ordinal})"),
        }
    }
}

/// Vote support value for `castVote` / `castVoteWithReason`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteChoice {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl VoteChoice {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Against => "Against",
            Self::For => "For",
            Self::Abstain => "Abstain",
        }
    }
}

impl TryFrom<u8> for VoteChoice {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Against),
            1 => Ok(Self::For),
            2 => Ok(Self::Abstain),
            other => Err(TypesError::UnknownVoteChoice(other.to_string())),
        }
    }
}

impl FromStr for VoteChoice {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "against" | "no" | "0" => Ok(Self::Against),
            "for" | "yes" | "1" => Ok(Self::For),
            "abstain" | "2" => Ok(Self::Abstain),
            _ => Err(TypesError::UnknownVoteChoice(s.to_string())),
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_governor_enum() {
        for (i, state) in ProposalState::ALL.iter().enumerate() {
            assert_eq!(state.ordinal() as usize, i);
            assert_eq!(ProposalState::try_from(i as u8).unwrap(), *state);
        }
    }

    #[test]
    fn out_of_range_ordinal_is_rejected() {
        assert_eq!(
            ProposalState::try_from(8),
            Err(TypesError::UnknownProposalState(8))
        );
        assert_eq!(ObservedState::from(200), ObservedState::Unrecognized(200));
        assert_eq!(ObservedState::from(200).to_string(), "Unknown(200)");
    }

    #[test]
    fn terminal_states() {
        assert!(ProposalState::Executed.is_terminal());
        assert!(ProposalState::Defeated.is_terminal());
        assert!(!ProposalState::Succeeded.is_terminal());
        assert!(!ProposalState::Queued.is_terminal());
    }

    #[test]
    fn vote_choice_parsing() {
        assert_eq!("for".parse::<VoteChoice>().unwrap(), VoteChoice::For);
        assert_eq!("Against".parse::<VoteChoice>().unwrap(), VoteChoice::Against);
        assert_eq!("2".parse::<VoteChoice>().unwrap(), VoteChoice::Abstain);
        assert!("maybe".parse::<VoteChoice>().is_err());
        assert_eq!(VoteChoice::For.as_u8(), 1);
    }
}
