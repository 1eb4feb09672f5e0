use govctl_types::ProposalId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("invalid proposal identity: {0}")]
    InvalidIdentity(String),

    #[error("proposal {proposal_id} reported unrecognized state ordinal {ordinal}")]
    UnknownState { proposal_id: ProposalId, ordinal: u8 },

    #[error("abi encoding failed: {0}")]
    Abi(#[from] govctl_abi::AbiError),

    #[error("manifest {path}: {detail}")]
    Manifest { path: String, detail: String },

    #[error("manifest id {recorded} does not match derived id {derived}")]
    ManifestIdMismatch {
        recorded: ProposalId,
        derived: ProposalId,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
