//! Reporting Sink: the human-facing record of a flow.
//!
//! Flows emit [`Report`] values; what happens to them is up to the
//! [`ReportSink`]. The CLI prints them, [`TracingSink`] logs them as
//! structured events, and tests record them.

use std::fmt;
use std::path::PathBuf;

use govctl_governance::WaitReason;
use govctl_types::{
    Address, BlockNumber, Bytes, ObservedState, ProposalId, ProposalState, TokenAmount, TxHash,
    VoteChoice, VotingWindow, B256,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    /// The propose call about to be submitted.
    ProposalEncoded {
        calldata: Bytes,
        description_hash: B256,
        proposal_id: ProposalId,
    },
    Submitted {
        action: String,
        tx_hash: TxHash,
    },
    /// One poll of the confirmation wait.
    Waiting {
        tx_hash: TxHash,
        confirmations: u64,
        required: u64,
    },
    Confirmed {
        action: String,
        tx_hash: TxHash,
        block: BlockNumber,
    },
    Proposed {
        proposal_id: ProposalId,
        state: ObservedState,
        voting_delay: u64,
        estimate: String,
    },
    ManifestWritten {
        path: PathBuf,
    },
    Voted {
        proposal_id: ProposalId,
        support: VoteChoice,
        weight: TokenAmount,
        remaining_blocks: Option<u64>,
        estimate: Option<String>,
        voting_period: u64,
    },
    Executed {
        proposal_id: ProposalId,
        account: Address,
        balance: TokenAmount,
    },
    AlreadyExecuted {
        proposal_id: ProposalId,
        account: Address,
        balance: TokenAmount,
    },
    /// The chain has to move on before the action becomes legal.
    NotYet {
        proposal_id: ProposalId,
        state: ProposalState,
        reason: WaitReason,
        blocks: Option<u64>,
        estimate: Option<String>,
    },
    Ineligible {
        proposal_id: ProposalId,
        action: String,
        state: ProposalState,
        reason: String,
    },
    Terminal {
        proposal_id: ProposalId,
        state: ProposalState,
        reason: String,
    },
    Status {
        proposal_id: ProposalId,
        state: ObservedState,
        window: Option<VotingWindow>,
        head: BlockNumber,
        has_voted: bool,
        estimate: Option<String>,
    },
    Delegated {
        delegatee: Address,
        votes: TokenAmount,
    },
}

impl Report {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProposalEncoded { .. } => "proposal_encoded",
            Self::Submitted { .. } => "submitted",
            Self::Waiting { .. } => "waiting",
            Self::Confirmed { .. } => "confirmed",
            Self::Proposed { .. } => "proposed",
            Self::ManifestWritten { .. } => "manifest_written",
            Self::Voted { .. } => "voted",
            Self::Executed { .. } => "executed",
            Self::AlreadyExecuted { .. } => "already_executed",
            Self::NotYet { .. } => "not_yet",
            Self::Ineligible { .. } => "ineligible",
            Self::Terminal { .. } => "terminal",
            Self::Status { .. } => "status",
            Self::Delegated { .. } => "delegated",
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProposalEncoded {
                calldata,
                description_hash,
                proposal_id,
            } => write!(
                f,
                "encoded proposal call {calldata}\ndescription hash: {description_hash}\nexpected proposal id: {proposal_id}"
            ),
            Self::Submitted { action, tx_hash } => write!(f, "{action} submitted: {tx_hash}"),
            Self::Waiting {
                tx_hash,
                confirmations,
                required,
            } => write!(f, "waiting for {tx_hash} ({confirmations}/{required} confirmations)"),
            Self::Confirmed {
                action,
                tx_hash,
                block,
            } => write!(f, "{action} confirmed in block {block}: {tx_hash}"),
            Self::Proposed {
                proposal_id,
                state,
                voting_delay,
                estimate,
            } => write!(
                f,
                "proposal created with id {proposal_id}\ncurrent state: {state}\nvoting starts in {voting_delay} blocks ({estimate})"
            ),
            Self::ManifestWritten { path } => write!(f, "manifest written to {}", path.display()),
            Self::Voted {
                proposal_id,
                support,
                weight,
                remaining_blocks,
                estimate,
                voting_period,
            } => {
                write!(
                    f,
                    "voted {support} on proposal {proposal_id} with weight {}",
                    weight.format_units()
                )?;
                if let Some(blocks) = remaining_blocks {
                    write!(f, "\nvoting ends in {blocks} blocks")?;
                    if let Some(estimate) = estimate {
                        write!(f, " ({estimate})")?;
                    }
                }
                write!(f, "\nvoting period: {voting_period} blocks")
            }
            Self::Executed {
                proposal_id,
                account,
                balance,
            } => write!(
                f,
                "proposal {proposal_id} executed\ntoken balance of {account}: {}",
                balance.format_units()
            ),
            Self::AlreadyExecuted {
                proposal_id,
                account,
                balance,
            } => write!(
                f,
                "proposal {proposal_id} already executed\ntoken balance of {account}: {}",
                balance.format_units()
            ),
            Self::NotYet {
                proposal_id,
                state,
                reason,
                blocks,
                estimate,
            } => {
                write!(f, "proposal {proposal_id} is {state}: {reason}")?;
                if let Some(blocks) = blocks {
                    write!(f, "\n{blocks} blocks remaining")?;
                    if let Some(estimate) = estimate {
                        write!(f, " ({estimate})")?;
                    }
                }
                Ok(())
            }
            Self::Ineligible {
                proposal_id,
                action,
                state,
                reason,
            } => write!(f, "cannot {action} proposal {proposal_id} in state {state}: {reason}"),
            Self::Terminal {
                proposal_id,
                state,
                reason,
            } => write!(f, "proposal {proposal_id} is {state}: {reason}"),
            Self::Status {
                proposal_id,
                state,
                window,
                head,
                has_voted,
                estimate,
            } => {
                write!(f, "proposal {proposal_id}\nstate: {state}\nhead: {head}")?;
                if let Some(window) = window {
                    write!(f, "\nvoting window: {window}")?;
                    let remaining = window.remaining_blocks(*head);
                    if remaining > 0 {
                        write!(f, "\nvoting ends in {remaining} blocks")?;
                        if let Some(estimate) = estimate {
                            write!(f, " ({estimate})")?;
                        }
                    }
                }
                if *has_voted {
                    write!(f, "\nthis account has voted")?;
                }
                Ok(())
            }
            Self::Delegated { delegatee, votes } => write!(
                f,
                "votes delegated to {delegatee}\nvoting power: {}",
                votes.format_units()
            ),
        }
    }
}

/// Where flow reports go.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: &Report);
}

/// Emits every report as a structured `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, report: &Report) {
        match serde_json::to_string(report) {
            Ok(fields) => tracing::info!(kind = report.kind(), %fields, "{report}"),
            Err(_) => tracing::info!(kind = report.kind(), "{report}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_types::U256;

    fn id() -> ProposalId {
        ProposalId::new(U256::from(42u64))
    }

    #[test]
    fn already_executed_mentions_balance() {
        let report = Report::AlreadyExecuted {
            proposal_id: id(),
            account: Address::ZERO,
            balance: TokenAmount::from_whole(100),
        };
        let text = report.to_string();
        assert!(text.contains("already executed"));
        assert!(text.contains("100"));
        assert_eq!(report.kind(), "already_executed");
    }

    #[test]
    fn vote_report_includes_estimate() {
        let report = Report::Voted {
            proposal_id: id(),
            support: VoteChoice::For,
            weight: TokenAmount::from_whole(1_000),
            remaining_blocks: Some(50),
            estimate: Some("~10 minutes".into()),
            voting_period: 50_400,
        };
        let text = report.to_string();
        assert!(text.contains("voting ends in 50 blocks (~10 minutes)"));
        assert!(text.contains("voting period: 50400 blocks"));
    }

    #[test]
    fn unknown_state_is_printed_with_ordinal() {
        let report = Report::Status {
            proposal_id: id(),
            state: ObservedState::Unrecognized(9),
            window: None,
            head: 10,
            has_voted: false,
            estimate: None,
        };
        assert!(report.to_string().contains("Unknown(9)"));
    }

    #[test]
    fn reports_serialize_with_kind_tag() {
        let report = Report::Submitted {
            action: "vote".into(),
            tx_hash: TxHash::ZERO,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "submitted");
        assert_eq!(json["action"], "vote");
    }
}
