//! Parsing and decoding errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("unknown proposal state ordinal {0}")]
    UnknownProposalState(u8),

    #[error("unknown vote choice: {0}")]
    UnknownVoteChoice(String),

    #[error("invalid proposal id {input:?}: {reason}")]
    InvalidProposalId { input: String, reason: String },

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("invalid token amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },
}
