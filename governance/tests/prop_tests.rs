use proptest::prelude::*;

use govctl_governance::{decide, Decision, Intent, Observation, ProposalCall, ProposalIdentity};
use govctl_types::{Address, ObservedState, ProposalId, ProposalState, VotingWindow, U256};

fn arb_call() -> impl Strategy<Value = ProposalCall> {
    (
        prop::array::uniform20(any::<u8>()),
        any::<u64>(),
        prop::collection::vec(any::<u8>(), 0..80),
    )
        .prop_map(|(target, value, calldata)| {
            ProposalCall::new(Address::from(target), U256::from(value), calldata)
        })
}

fn arb_state() -> impl Strategy<Value = ProposalState> {
    (0u8..8).prop_map(|n| ProposalState::try_from(n).unwrap())
}

proptest! {
    /// Identical inputs always derive identical fingerprint and id.
    #[test]
    fn identity_is_deterministic(
        calls in prop::collection::vec(arb_call(), 1..4),
        description in ".{0,80}",
    ) {
        let a = ProposalIdentity::new(calls.clone(), description.clone()).unwrap();
        let b = ProposalIdentity::new(calls, description).unwrap();
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
        prop_assert_eq!(a.proposal_id(), b.proposal_id());
        prop_assert_eq!(a.propose_calldata().unwrap(), b.propose_calldata().unwrap());
    }

    /// Changing a single character of the description changes the fingerprint.
    #[test]
    fn description_edit_changes_fingerprint(
        call in arb_call(),
        description in "[a-z]{1,40}",
        index in any::<prop::sample::Index>(),
    ) {
        let i = index.index(description.len());
        let mut edited = description.clone().into_bytes();
        edited[i] = if edited[i] == b'z' { b'a' } else { edited[i] + 1 };
        let edited = String::from_utf8(edited).unwrap();

        let a = ProposalIdentity::new(vec![call.clone()], description).unwrap();
        let b = ProposalIdentity::new(vec![call], edited).unwrap();
        prop_assert_ne!(a.fingerprint(), b.fingerprint());
        prop_assert_ne!(a.proposal_id(), b.proposal_id());
    }

    /// Votes are only ever submitted for an Active proposal the account has
    /// not voted on, inside the window.
    #[test]
    fn vote_submission_requires_open_active(
        state in arb_state(),
        head in 0u64..200,
        has_voted in any::<bool>(),
    ) {
        let window = VotingWindow::new(50, 150);
        let obs = Observation {
            proposal_id: ProposalId::new(U256::from(1u64)),
            state: state.into(),
            window: Some(window),
            head,
            has_voted,
        };
        let decision = decide(Intent::CastVote, &obs).unwrap();
        let expected = state == ProposalState::Active && !has_voted && head <= window.end;
        prop_assert_eq!(decision == Decision::SubmitVote, expected);
    }

    /// Execute is only ever submitted for Succeeded or Queued.
    #[test]
    fn execute_submission_requires_passed(state in arb_state(), head in 0u64..200) {
        let obs = Observation {
            proposal_id: ProposalId::new(U256::from(1u64)),
            state: state.into(),
            window: Some(VotingWindow::new(50, 150)),
            head,
            has_voted: false,
        };
        let decision = decide(Intent::Execute, &obs).unwrap();
        let expected = matches!(state, ProposalState::Succeeded | ProposalState::Queued);
        prop_assert_eq!(decision.submits(), expected);
    }

    /// Any ordinal outside the Governor enum is refused for every intent.
    #[test]
    fn unknown_ordinals_fail(ordinal in 8u8..) {
        let obs = Observation {
            proposal_id: ProposalId::new(U256::from(1u64)),
            state: ObservedState::from(ordinal),
            window: None,
            head: 0,
            has_voted: false,
        };
        prop_assert!(decide(Intent::Inspect, &obs).is_err());
        prop_assert!(decide(Intent::CastVote, &obs).is_err());
        prop_assert!(decide(Intent::Execute, &obs).is_err());
    }
}
