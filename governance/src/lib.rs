//! Governance proposal logic for govctl.
//!
//! - [`identity`]: derives the description hash and proposal id from the
//!   exact call tuple, the way OpenZeppelin's `hashProposal` does
//! - [`contract`]: one encoder per Governor / token call and the event schemas
//! - [`lifecycle`]: the pure decision engine mapping (intent, observed state)
//!   to the next legal step
//! - [`manifest`]: persisted proposal parameters for later execution

pub mod contract;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod manifest;

pub use error::GovernanceError;
pub use identity::{ProposalCall, ProposalIdentity, WELL_KNOWN_DESCRIPTION, WELL_KNOWN_MINT_WHOLE};
pub use lifecycle::{decide, Decision, Intent, Observation, WaitReason};
pub use manifest::ProposalManifest;
