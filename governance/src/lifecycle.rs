//! Lifecycle decision engine.
//!
//! Maps a requested intent plus a fresh observation of the Governor onto the
//! one legal next step. The engine is pure: it never reads the ledger and
//! never caches state, so every decision is taken against a new observation.

use govctl_types::{BlockNumber, ObservedState, ProposalId, ProposalState, VotingWindow};
use serde::Serialize;
use std::fmt;

use crate::error::GovernanceError;

/// What the operator asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Intent {
    CastVote,
    Execute,
    Inspect,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CastVote => "vote",
            Self::Execute => "execute",
            Self::Inspect => "status",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time reading of one proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub proposal_id: ProposalId,
    pub state: ObservedState,
    /// Present whenever the state is past `Pending`.
    pub window: Option<VotingWindow>,
    pub head: BlockNumber,
    /// Whether the acting account has already voted.
    pub has_voted: bool,
}

impl Observation {
    /// Blocks until the voting deadline, if the window is known.
    pub fn remaining_blocks(&self) -> Option<u64> {
        self.window.map(|w| w.remaining_blocks(self.head))
    }
}

/// Why a flow has to wait for the chain to move on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WaitReason {
    VotingNotStarted,
    VotingInProgress,
    AwaitingTally,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VotingNotStarted => "voting has not started yet",
            Self::VotingInProgress => "voting is still in progress",
            Self::AwaitingTally => "voting period ended, awaiting the state transition",
        })
    }
}

/// The legal next step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// Submit `castVoteWithReason`.
    SubmitVote,
    /// Submit `execute` with the proposal's identity parameters.
    SubmitExecute,
    /// Nothing to do yet. `blocks` counts to the next boundary when known.
    Wait {
        reason: WaitReason,
        blocks: Option<u64>,
    },
    /// The proposal was already executed; nothing to submit.
    AlreadyExecuted,
    /// The proposal is finished and cannot reach the requested outcome.
    Terminal {
        state: ProposalState,
        reason: &'static str,
    },
    /// The requested action is not legal in the observed state.
    Ineligible {
        state: ProposalState,
        reason: String,
    },
    /// Inspection only.
    Report,
}

impl Decision {
    /// Whether this decision leads to a ledger write.
    pub fn submits(&self) -> bool {
        matches!(self, Self::SubmitVote | Self::SubmitExecute)
    }

    /// Whether the flow ends successfully without a write.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::AlreadyExecuted | Self::Report)
    }
}

/// Decide the next step for `intent` given `observation`.
///
/// An unrecognized state ordinal is an error for every intent, inspection
/// included, so a contract upgrade that adds states cannot be silently
/// misread.
pub fn decide(intent: Intent, observation: &Observation) -> Result<Decision, GovernanceError> {
    let state = match observation.state {
        ObservedState::Known(state) => state,
        ObservedState::Unrecognized(ordinal) => {
            return Err(GovernanceError::UnknownState {
                proposal_id: observation.proposal_id,
                ordinal,
            })
        }
    };

    let decision = match intent {
        Intent::Inspect => Decision::Report,
        Intent::CastVote => decide_vote(state, observation),
        Intent::Execute => decide_execute(state, observation),
    };

    tracing::debug!(
        proposal_id = %observation.proposal_id,
        %state,
        head = observation.head,
        intent = intent.as_str(),
        ?decision,
        "lifecycle decision"
    );
    Ok(decision)
}

fn decide_vote(state: ProposalState, observation: &Observation) -> Decision {
    match state {
        ProposalState::Pending => Decision::Ineligible {
            state,
            reason: "voting delay has not elapsed; voting has not started".to_string(),
        },
        ProposalState::Active if observation.has_voted => Decision::Ineligible {
            state,
            reason: "this account has already voted on the proposal".to_string(),
        },
        ProposalState::Active => match observation.window {
            Some(window) if observation.head > window.end => Decision::Ineligible {
                state,
                reason: format!(
                    "voting window closed at block {}; awaiting tally",
                    window.end
                ),
            },
            _ => Decision::SubmitVote,
        },
        other => Decision::Ineligible {
            state: other,
            reason: format!("voting is closed; proposal is {other}"),
        },
    }
}

fn decide_execute(state: ProposalState, observation: &Observation) -> Decision {
    match state {
        ProposalState::Pending => Decision::Wait {
            reason: WaitReason::VotingNotStarted,
            blocks: observation
                .window
                .map(|w| w.blocks_until_open(observation.head)),
        },
        ProposalState::Active => match observation.window {
            Some(window) if observation.head > window.end => Decision::Wait {
                reason: WaitReason::AwaitingTally,
                blocks: Some(0),
            },
            _ => Decision::Wait {
                reason: WaitReason::VotingInProgress,
                blocks: observation.remaining_blocks(),
            },
        },
        ProposalState::Succeeded | ProposalState::Queued => Decision::SubmitExecute,
        ProposalState::Executed => Decision::AlreadyExecuted,
        ProposalState::Defeated => Decision::Terminal {
            state,
            reason: "proposal was defeated; create a new proposal",
        },
        ProposalState::Canceled => Decision::Terminal {
            state,
            reason: "proposal was canceled",
        },
        ProposalState::Expired => Decision::Terminal {
            state,
            reason: "execution window lapsed; proposal must be recreated",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_types::U256;

    fn observe(state: ProposalState, head: BlockNumber, has_voted: bool) -> Observation {
        Observation {
            proposal_id: ProposalId::new(U256::from(1u64)),
            state: state.into(),
            window: (state != ProposalState::Pending).then(|| VotingWindow::new(10, 60)),
            head,
            has_voted,
        }
    }

    #[test]
    fn active_not_voted_submits_vote() {
        let d = decide(Intent::CastVote, &observe(ProposalState::Active, 20, false)).unwrap();
        assert_eq!(d, Decision::SubmitVote);
    }

    #[test]
    fn active_already_voted_is_rejected_without_write() {
        let d = decide(Intent::CastVote, &observe(ProposalState::Active, 20, true)).unwrap();
        assert!(matches!(d, Decision::Ineligible { state: ProposalState::Active, .. }));
        assert!(!d.submits());
    }

    #[test]
    fn active_past_deadline_is_ineligible_for_vote() {
        let d = decide(Intent::CastVote, &observe(ProposalState::Active, 61, false)).unwrap();
        assert!(matches!(d, Decision::Ineligible { .. }));

        let d = decide(Intent::CastVote, &observe(ProposalState::Active, 60, false)).unwrap();
        assert_eq!(d, Decision::SubmitVote);
    }

    #[test]
    fn pending_vote_is_rejected() {
        let d = decide(Intent::CastVote, &observe(ProposalState::Pending, 5, false)).unwrap();
        assert!(matches!(d, Decision::Ineligible { state: ProposalState::Pending, .. }));
    }

    #[test]
    fn vote_rejected_outside_active() {
        for state in ProposalState::ALL {
            if state == ProposalState::Active {
                continue;
            }
            let d = decide(Intent::CastVote, &observe(state, 100, false)).unwrap();
            assert!(!d.submits(), "{state} must not submit a vote");
        }
    }

    #[test]
    fn execute_table() {
        let cases = [
            (ProposalState::Succeeded, Decision::SubmitExecute),
            (ProposalState::Queued, Decision::SubmitExecute),
            (ProposalState::Executed, Decision::AlreadyExecuted),
        ];
        for (state, expected) in cases {
            assert_eq!(decide(Intent::Execute, &observe(state, 100, false)).unwrap(), expected);
        }
        for state in [
            ProposalState::Defeated,
            ProposalState::Canceled,
            ProposalState::Expired,
        ] {
            let d = decide(Intent::Execute, &observe(state, 100, false)).unwrap();
            assert!(matches!(d, Decision::Terminal { .. }));
        }
    }

    #[test]
    fn execute_waits_while_voting() {
        let d = decide(Intent::Execute, &observe(ProposalState::Active, 20, true)).unwrap();
        assert_eq!(
            d,
            Decision::Wait {
                reason: WaitReason::VotingInProgress,
                blocks: Some(40)
            }
        );

        let d = decide(Intent::Execute, &observe(ProposalState::Pending, 5, false)).unwrap();
        assert_eq!(
            d,
            Decision::Wait {
                reason: WaitReason::VotingNotStarted,
                blocks: None
            }
        );
    }

    #[test]
    fn executed_rejects_vote_and_settles_execute() {
        let obs = observe(ProposalState::Executed, 100, false);
        assert!(!decide(Intent::CastVote, &obs).unwrap().submits());
        let d = decide(Intent::Execute, &obs).unwrap();
        assert!(d.is_settled());
        assert!(!d.submits());
    }

    #[test]
    fn unrecognized_state_fails_for_every_intent() {
        let mut obs = observe(ProposalState::Active, 20, false);
        obs.state = ObservedState::Unrecognized(9);
        for intent in [Intent::CastVote, Intent::Execute, Intent::Inspect] {
            let err = decide(intent, &obs).unwrap_err();
            assert!(matches!(err, GovernanceError::UnknownState { ordinal: 9, .. }));
        }
    }

    #[test]
    fn inspect_reports() {
        let d = decide(Intent::Inspect, &observe(ProposalState::Defeated, 1, false)).unwrap();
        assert_eq!(d, Decision::Report);
    }
}
