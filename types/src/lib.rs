//! Fundamental types for govctl.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! proposal identifiers, transaction hashes, token amounts, block heights,
//! voting windows and the lifecycle state enums reported by the Governor.

pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod proposal;
pub mod state;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use amount::TokenAmount;
pub use block::{estimate_duration, BlockNumber, VotingWindow};
pub use error::TypesError;
pub use hash::TxHash;
pub use proposal::ProposalId;
pub use state::{ObservedState, ProposalState, VoteChoice};
