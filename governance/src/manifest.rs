//! Proposal manifest: the parameters a proposal was created with, persisted
//! so `execute` can replay them exactly.

use govctl_types::{Address, ProposalId, B256};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::GovernanceError;
use crate::identity::{ProposalCall, ProposalIdentity};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalManifest {
    /// Decimal id as assigned by the Governor.
    pub proposal_id: String,
    pub governor: Address,
    pub description_hash: B256,
    pub description: String,
    pub calls: Vec<ProposalCall>,
}

impl ProposalManifest {
    pub fn new(proposal_id: ProposalId, governor: Address, identity: &ProposalIdentity) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            governor,
            description_hash: identity.fingerprint(),
            description: identity.description().to_string(),
            calls: identity.calls().to_vec(),
        }
    }

    pub fn proposal_id(&self) -> Result<ProposalId, GovernanceError> {
        self.proposal_id
            .parse()
            .map_err(|e: govctl_types::TypesError| GovernanceError::Manifest {
                path: "<memory>".to_string(),
                detail: e.to_string(),
            })
    }

    /// Rebuild the identity and check that it still hashes to the recorded id.
    pub fn identity(&self) -> Result<ProposalIdentity, GovernanceError> {
        let identity = ProposalIdentity::new(self.calls.clone(), self.description.clone())?;
        let recorded = self.proposal_id()?;
        let derived = identity.proposal_id();
        if recorded != derived {
            return Err(GovernanceError::ManifestIdMismatch { recorded, derived });
        }
        Ok(identity)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), GovernanceError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| manifest_err(path, e))?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), proposal_id = %self.proposal_id, "manifest written");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, GovernanceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| manifest_err(path, e))?;
        serde_json::from_str(&contents).map_err(|e| manifest_err(path, e))
    }
}

fn manifest_err(path: &Path, err: impl std::fmt::Display) -> GovernanceError {
    GovernanceError::Manifest {
        path: path.display().to_string(),
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_types::U256;

    fn identity() -> ProposalIdentity {
        let token: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
        let to: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        ProposalIdentity::well_known(token, to).unwrap()
    }

    fn governor() -> Address {
        "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".parse().unwrap()
    }

    #[test]
    fn write_then_read_restores_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proposal.json");
        let identity = identity();
        let manifest = ProposalManifest::new(identity.proposal_id(), governor(), &identity);
        manifest.write_to(&path).unwrap();

        let loaded = ProposalManifest::read_from(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.identity().unwrap(), identity);
    }

    #[test]
    fn tampered_manifest_is_rejected() {
        let identity = identity();
        let mut manifest = ProposalManifest::new(identity.proposal_id(), governor(), &identity);
        manifest.calls[0].value = U256::from(1u64);
        assert!(matches!(
            manifest.identity().unwrap_err(),
            GovernanceError::ManifestIdMismatch { .. }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ProposalManifest::read_from(Path::new("/nonexistent/manifest.json")).unwrap_err();
        match err {
            GovernanceError::Manifest { path, .. } => assert!(path.contains("nonexistent")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
