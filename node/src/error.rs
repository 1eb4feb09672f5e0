use std::path::PathBuf;

use govctl_governance::GovernanceError;
use govctl_types::{ProposalId, TxHash, U256};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Everything a lifecycle flow can fail with.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Missing or invalid configuration; raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The Governor does not know this id, or the identity does not hash to it.
    #[error("proposal {proposal_id}: identity mismatch: {detail}")]
    IdentityMismatch {
        proposal_id: ProposalId,
        detail: String,
    },

    #[error("cannot {action} proposal {proposal_id} in state {state}: {reason}")]
    StateIneligible {
        proposal_id: ProposalId,
        state: String,
        action: String,
        reason: String,
    },

    #[error("proposal {proposal_id} reported unrecognized state ordinal {ordinal}")]
    UnknownState { proposal_id: ProposalId, ordinal: U256 },

    /// Refused by the node before inclusion. Safe to retry unchanged.
    #[error("{action} rejected before inclusion: {message}")]
    SubmissionRejected { action: String, message: String },

    /// Rejected by the contract. `tx_hash` is absent when the revert was
    /// caught during gas estimation.
    #[error("{action} reverted{}: {reason}", in_tx(.tx_hash))]
    RemoteRevert {
        action: String,
        tx_hash: Option<TxHash>,
        reason: String,
    },

    /// The confirmation wait was aborted. The transaction may still land.
    #[error("{action} wait cancelled; transaction {tx_hash} may still be included")]
    Cancelled { action: String, tx_hash: TxHash },

    /// Confirmed, but the expected event was not found in the receipt.
    #[error("transaction {tx_hash} confirmed but no {event} event was found; raw receipt: {raw_receipt}")]
    MissingEvent {
        tx_hash: TxHash,
        event: String,
        raw_receipt: String,
    },

    /// The proposal exists on-chain but its parameters could not be saved.
    #[error("proposal {proposal_id} created in {tx_hash}, but the manifest could not be written to {}: {detail}", .path.display())]
    ManifestNotWritten {
        proposal_id: ProposalId,
        tx_hash: TxHash,
        path: PathBuf,
        detail: String,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("governance error: {0}")]
    Governance(GovernanceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn in_tx(tx_hash: &Option<TxHash>) -> String {
    tx_hash.map(|h| format!(" in {h}")).unwrap_or_default()
}

impl OrchestratorError {
    /// Whether resubmitting the same request unchanged is safe.
    ///
    /// After a revert the decision engine must run again first, and after a
    /// cancelled wait the original transaction may still be included.
    pub fn is_retry_safe(&self) -> bool {
        matches!(
            self,
            Self::SubmissionRejected { .. } | Self::Ledger(LedgerError::Unreachable(_))
        )
    }
}

impl From<GovernanceError> for OrchestratorError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::UnknownState {
                proposal_id,
                ordinal,
            } => Self::UnknownState {
                proposal_id,
                ordinal: U256::from(ordinal),
            },
            GovernanceError::ManifestIdMismatch { recorded, derived } => Self::IdentityMismatch {
                proposal_id: recorded,
                detail: format!("manifest parameters hash to {derived}"),
            },
            other => Self::Governance(other),
        }
    }
}
