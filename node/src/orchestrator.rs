//! Lifecycle flows: propose, vote, execute, delegate, status.
//!
//! Every flow that acts on an existing proposal observes it first, asks the
//! decision engine for the next legal step and only then submits. Refusals
//! are reported through the sink and returned as `StateIneligible`.

use std::path::Path;
use std::sync::Arc;

use govctl_abi::Token;
use govctl_governance::contract::{governor, token};
use govctl_governance::{
    decide, Decision, Intent, Observation, ProposalIdentity, ProposalManifest,
};
use govctl_types::{Address, ProposalId, ProposalState, TokenAmount, TxHash, VoteChoice, U256};
use tracing::Instrument;

use crate::config::OrchestratorConfig;
use crate::ledger::{Ledger, LedgerError};
use crate::reader::{StateReader, TimeEstimate};
use crate::report::{Report, ReportSink};
use crate::shutdown::ShutdownController;
use crate::submitter::{find_event, Submission, Submitter, SubmitterSettings};
use crate::tracing_spans::flow_span;
use crate::OrchestratorError;

/// Default reason attached to votes.
pub const DEFAULT_VOTE_REASON: &str = "I support this proposal";

/// What a flow achieved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Proposed {
        proposal_id: ProposalId,
        tx_hash: TxHash,
        /// Whether the Governor's id equals the locally derived one.
        matches_local: bool,
    },
    Voted {
        proposal_id: ProposalId,
        tx_hash: TxHash,
        weight: TokenAmount,
    },
    Executed {
        proposal_id: ProposalId,
        tx_hash: TxHash,
        balance: TokenAmount,
    },
    AlreadyExecuted {
        proposal_id: ProposalId,
        balance: TokenAmount,
    },
    Delegated {
        delegatee: Address,
        tx_hash: TxHash,
        votes: TokenAmount,
    },
    Status(Observation),
}

/// The deployed contracts a flow talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contracts {
    pub governor: Address,
    pub token: Option<Address>,
}

pub struct Orchestrator {
    reader: StateReader,
    submitter: Submitter,
    governor: Address,
    estimate: TimeEstimate,
    sink: Arc<dyn ReportSink>,
}

impl Orchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        account: Address,
        contracts: Contracts,
        settings: SubmitterSettings,
        estimate: TimeEstimate,
        shutdown: ShutdownController,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let mut reader = StateReader::new(ledger.clone(), contracts.governor);
        if let Some(token) = contracts.token {
            reader = reader.with_token(token);
        }
        Self {
            reader,
            submitter: Submitter::new(ledger, account, settings, shutdown),
            governor: contracts.governor,
            estimate,
            sink,
        }
    }

    /// Build from validated configuration. The governor must be set; the
    /// token is optional for flows that never touch it.
    pub fn from_config(
        config: &OrchestratorConfig,
        ledger: Arc<dyn Ledger>,
        account: Address,
        shutdown: ShutdownController,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let contracts = Contracts {
            governor: config.require_governor()?,
            token: config.require_token().ok(),
        };
        let settings = SubmitterSettings {
            poll_interval: config.poll_interval(),
            confirmations: config.confirmations,
            gas_limit: config.gas_limit,
        };
        Ok(Self::new(
            ledger,
            account,
            contracts,
            settings,
            TimeEstimate::new(config.block_interval()),
            shutdown,
            sink,
        ))
    }

    /// The acting account.
    pub fn account(&self) -> Address {
        self.submitter.from()
    }

    pub fn reader(&self) -> &StateReader {
        &self.reader
    }

    /// Create a proposal and report the id the Governor assigned.
    ///
    /// When `manifest` is given, the exact parameters are written there as
    /// soon as the id is known so `execute` can reuse them.
    pub async fn propose(
        &self,
        identity: &ProposalIdentity,
        manifest: Option<&Path>,
    ) -> Result<Outcome, OrchestratorError> {
        let local_id = identity.proposal_id();
        self.propose_flow(identity, local_id, manifest)
            .instrument(flow_span("propose", &local_id.to_string()))
            .await
    }

    async fn propose_flow(
        &self,
        identity: &ProposalIdentity,
        local_id: ProposalId,
        manifest: Option<&Path>,
    ) -> Result<Outcome, OrchestratorError> {
        let calldata = identity.propose_calldata()?;
        self.sink.report(&Report::ProposalEncoded {
            calldata: calldata.clone().into(),
            description_hash: identity.fingerprint(),
            proposal_id: local_id,
        });

        let receipt = self
            .submitter
            .submit(&Submission::new("propose", self.governor, calldata), self.sink.as_ref())
            .await?;
        let created = find_event(&receipt, self.governor, &governor::proposal_created())?;
        let proposal_id = created
            .uint("proposalId")
            .map(ProposalId::new)
            .map_err(|e| OrchestratorError::MissingEvent {
                tx_hash: receipt.tx_hash,
                event: format!("ProposalCreated.proposalId ({e})"),
                raw_receipt: receipt.raw.to_string(),
            })?;

        let matches_local = proposal_id == local_id;
        if !matches_local {
            tracing::warn!(%proposal_id, %local_id, "governor assigned a different proposal id than derived locally");
        }
        tracing::info!(%proposal_id, tx_hash = %receipt.tx_hash, "proposal created");

        let state = self.reader.read_state(proposal_id).await?;
        let voting_delay = self.reader.voting_delay().await?;
        self.sink.report(&Report::Proposed {
            proposal_id,
            state,
            voting_delay,
            estimate: self.estimate.describe(voting_delay),
        });

        if let Some(path) = manifest {
            ProposalManifest::new(proposal_id, self.governor, identity)
                .write_to(path)
                .map_err(|e| OrchestratorError::ManifestNotWritten {
                    proposal_id,
                    tx_hash: receipt.tx_hash,
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
            self.sink.report(&Report::ManifestWritten {
                path: path.to_path_buf(),
            });
        }

        Ok(Outcome::Proposed {
            proposal_id,
            tx_hash: receipt.tx_hash,
            matches_local,
        })
    }

    /// Cast a vote if, and only if, the proposal is open and this account
    /// has not voted yet.
    pub async fn vote(
        &self,
        proposal_id: ProposalId,
        support: VoteChoice,
        reason: &str,
    ) -> Result<Outcome, OrchestratorError> {
        self.vote_flow(proposal_id, support, reason)
            .instrument(flow_span("vote", &proposal_id.to_string()))
            .await
    }

    async fn vote_flow(
        &self,
        proposal_id: ProposalId,
        support: VoteChoice,
        reason: &str,
    ) -> Result<Outcome, OrchestratorError> {
        let observation = self.reader.snapshot(proposal_id, self.account()).await?;
        let decision = match decide(Intent::CastVote, &observation)? {
            Decision::SubmitVote => Decision::SubmitVote,
            Decision::Ineligible {
                state: ProposalState::Pending,
                reason,
            } => {
                let delay = self.reader.voting_delay().await?;
                Decision::Ineligible {
                    state: ProposalState::Pending,
                    reason: format!(
                        "{reason}; wait for the voting delay to pass, current voting delay is {delay} blocks ({})",
                        self.estimate.describe(delay)
                    ),
                }
            }
            other => other,
        };
        if decision != Decision::SubmitVote {
            return Err(self.refuse(Intent::CastVote, &observation, decision));
        }

        let calldata = governor::cast_vote_with_reason()
            .encode_input(&[
                Token::Uint(proposal_id.as_u256()),
                Token::Uint(U256::from(support.as_u8())),
                Token::String(reason.to_string()),
            ])
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        let receipt = self
            .submitter
            .submit(&Submission::new("vote", self.governor, calldata), self.sink.as_ref())
            .await?;

        let cast = find_event(&receipt, self.governor, &governor::vote_cast())?;
        let weight = cast
            .uint("weight")
            .map(TokenAmount::new)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        let head = self.reader.head().await?;
        let remaining_blocks = observation.window.map(|w| w.remaining_blocks(head));
        let voting_period = self.reader.voting_period().await?;
        self.sink.report(&Report::Voted {
            proposal_id,
            support,
            weight,
            remaining_blocks,
            estimate: remaining_blocks.map(|b| self.estimate.describe(b)),
            voting_period,
        });

        Ok(Outcome::Voted {
            proposal_id,
            tx_hash: receipt.tx_hash,
            weight,
        })
    }

    /// Execute a succeeded or queued proposal with the parameters it was
    /// created with. Executing an already executed proposal is a no-op that
    /// still reports the balance.
    pub async fn execute(
        &self,
        proposal_id: ProposalId,
        identity: &ProposalIdentity,
    ) -> Result<Outcome, OrchestratorError> {
        self.execute_flow(proposal_id, identity)
            .instrument(flow_span("execute", &proposal_id.to_string()))
            .await
    }

    async fn execute_flow(
        &self,
        proposal_id: ProposalId,
        identity: &ProposalIdentity,
    ) -> Result<Outcome, OrchestratorError> {
        let observation = self.reader.snapshot(proposal_id, self.account()).await?;
        match decide(Intent::Execute, &observation)? {
            Decision::SubmitExecute => {}
            Decision::AlreadyExecuted => {
                let balance = self.reader.balance_of(self.account()).await?;
                tracing::info!(%proposal_id, "proposal already executed, nothing to submit");
                self.sink.report(&Report::AlreadyExecuted {
                    proposal_id,
                    account: self.account(),
                    balance,
                });
                return Ok(Outcome::AlreadyExecuted {
                    proposal_id,
                    balance,
                });
            }
            other => return Err(self.refuse(Intent::Execute, &observation, other)),
        }

        let derived = identity.proposal_id();
        if derived != proposal_id {
            return Err(OrchestratorError::IdentityMismatch {
                proposal_id,
                detail: format!("execution parameters hash to {derived}"),
            });
        }

        let calldata = identity.execute_calldata()?;
        let receipt = self
            .submitter
            .submit(&Submission::new("execute", self.governor, calldata), self.sink.as_ref())
            .await?;
        let executed = find_event(&receipt, self.governor, &governor::proposal_executed())?;
        if executed.uint("proposalId").ok() != Some(proposal_id.as_u256()) {
            tracing::warn!(%proposal_id, "ProposalExecuted event names a different proposal");
        }

        let balance = self.reader.balance_of(self.account()).await?;
        self.sink.report(&Report::Executed {
            proposal_id,
            account: self.account(),
            balance,
        });
        Ok(Outcome::Executed {
            proposal_id,
            tx_hash: receipt.tx_hash,
            balance,
        })
    }

    /// Delegate this account's voting power on the token.
    pub async fn delegate(&self, delegatee: Address) -> Result<Outcome, OrchestratorError> {
        self.delegate_flow(delegatee)
            .instrument(flow_span("delegate", "-"))
            .await
    }

    async fn delegate_flow(&self, delegatee: Address) -> Result<Outcome, OrchestratorError> {
        let token_address = self.reader.token()?;
        let calldata = token::delegate(delegatee).map_err(|e| LedgerError::Decode(e.to_string()))?;
        let receipt = self
            .submitter
            .submit(&Submission::new("delegate", token_address, calldata), self.sink.as_ref())
            .await?;
        find_event(&receipt, token_address, &token::delegate_changed())?;

        let votes = self.reader.votes_of(delegatee).await?;
        self.sink.report(&Report::Delegated { delegatee, votes });
        Ok(Outcome::Delegated {
            delegatee,
            tx_hash: receipt.tx_hash,
            votes,
        })
    }

    /// Observe and report a proposal. Never submits.
    pub async fn status(&self, proposal_id: ProposalId) -> Result<Outcome, OrchestratorError> {
        async {
            let observation = self.reader.snapshot(proposal_id, self.account()).await?;
            self.sink.report(&Report::Status {
                proposal_id,
                state: observation.state,
                window: observation.window,
                head: observation.head,
                has_voted: observation.has_voted,
                estimate: observation
                    .remaining_blocks()
                    .filter(|b| *b > 0)
                    .map(|b| self.estimate.describe(b)),
            });
            decide(Intent::Inspect, &observation)?;
            Ok(Outcome::Status(observation))
        }
        .instrument(flow_span("status", &proposal_id.to_string()))
        .await
    }

    /// Report why `intent` cannot proceed and build the matching error.
    fn refuse(&self, intent: Intent, observation: &Observation, decision: Decision) -> OrchestratorError {
        let proposal_id = observation.proposal_id;
        let reason = match decision {
            Decision::Wait { reason, blocks } => {
                if let Some(state) = observation.state.known() {
                    self.sink.report(&Report::NotYet {
                        proposal_id,
                        state,
                        reason,
                        blocks,
                        estimate: blocks.map(|b| self.estimate.describe(b)),
                    });
                }
                match blocks {
                    Some(blocks) => format!("{reason} ({blocks} blocks remaining)"),
                    None => reason.to_string(),
                }
            }
            Decision::Terminal { state, reason } => {
                self.sink.report(&Report::Terminal {
                    proposal_id,
                    state,
                    reason: reason.to_string(),
                });
                reason.to_string()
            }
            Decision::Ineligible { state, reason } => {
                self.sink.report(&Report::Ineligible {
                    proposal_id,
                    action: intent.as_str().to_string(),
                    state,
                    reason: reason.clone(),
                });
                reason
            }
            other => format!("no {intent} step for decision {other:?}"),
        };
        tracing::info!(%proposal_id, state = %observation.state, intent = intent.as_str(), %reason, "action refused");
        OrchestratorError::StateIneligible {
            proposal_id,
            state: observation.state.to_string(),
            action: intent.as_str().to_string(),
            reason,
        }
    }
}
