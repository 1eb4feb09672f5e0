//! State Reader: typed reads of the Governor and its token.
//!
//! Nothing read here is cached. Every call goes back to the ledger so the
//! decision engine always works on a fresh observation.

use std::sync::Arc;
use std::time::Duration;

use govctl_abi::{AbiError, Function, Token, WORD};
use govctl_governance::contract::{decode_bool, decode_uint, governor, token};
use govctl_governance::Observation;
use govctl_types::{
    estimate_duration, Address, BlockNumber, ObservedState, ProposalId, ProposalState,
    TokenAmount, VotingWindow, U256,
};
use tracing::Instrument;

use crate::ledger::{CallMsg, Ledger, LedgerError};
use crate::tracing_spans::observe_span;
use crate::OrchestratorError;

/// Turns block counts into wall-clock estimates.
///
/// Uses a fixed average block interval, so the result is a heuristic for
/// display. Never sleep on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeEstimate {
    pub block_interval: Duration,
}

impl TimeEstimate {
    pub fn new(block_interval: Duration) -> Self {
        Self { block_interval }
    }

    pub fn for_blocks(&self, blocks: u64) -> Duration {
        estimate_duration(blocks, self.block_interval)
    }

    /// "~N minutes" for `blocks` blocks.
    pub fn describe(&self, blocks: u64) -> String {
        govctl_utils::format_minutes(self.for_blocks(blocks))
    }
}

impl Default for TimeEstimate {
    fn default() -> Self {
        Self::new(Duration::from_secs(12))
    }
}

pub struct StateReader {
    ledger: Arc<dyn Ledger>,
    governor: Address,
    token: Option<Address>,
}

impl StateReader {
    pub fn new(ledger: Arc<dyn Ledger>, governor: Address) -> Self {
        Self {
            ledger,
            governor,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    pub fn governor(&self) -> Address {
        self.governor
    }

    pub fn token(&self) -> Result<Address, OrchestratorError> {
        self.token.ok_or_else(|| {
            OrchestratorError::Configuration("token address not configured (set TOKEN_ADDRESS)".into())
        })
    }

    /// Current head height.
    pub async fn head(&self) -> Result<BlockNumber, OrchestratorError> {
        Ok(self.ledger.block_number().await?)
    }

    /// `state(id)`. A revert means the Governor does not know the id.
    pub async fn read_state(&self, id: ProposalId) -> Result<ObservedState, OrchestratorError> {
        let function = governor::state();
        let data = function.encode_input(&[Token::Uint(id.as_u256())]).map_err(abi)?;
        let output = match self.ledger.call(&CallMsg::new(self.governor, data), None).await {
            Ok(output) => output,
            Err(LedgerError::Reverted { reason }) => {
                return Err(OrchestratorError::IdentityMismatch {
                    proposal_id: id,
                    detail: format!("governor {} rejected the id: {reason}", self.governor),
                })
            }
            Err(other) => return Err(other.into()),
        };
        if output.is_empty() {
            return Err(OrchestratorError::IdentityMismatch {
                proposal_id: id,
                detail: format!("{} returned no data for state(); is it a Governor?", self.governor),
            });
        }
        // Read the raw word rather than a strict `uint8` so an out-of-range
        // value still surfaces as an unrecognized state.
        let word = output.get(..WORD).ok_or_else(|| {
            LedgerError::Decode(format!("state() returned {} bytes", output.len()))
        })?;
        let value = U256::from_be_slice(word);
        match u8::try_from(value) {
            Ok(ordinal) => Ok(ObservedState::from(ordinal)),
            Err(_) => Err(OrchestratorError::UnknownState {
                proposal_id: id,
                ordinal: value,
            }),
        }
    }

    /// `proposalSnapshot(id)..=proposalDeadline(id)`.
    pub async fn read_window(&self, id: ProposalId) -> Result<VotingWindow, OrchestratorError> {
        let arg = [Token::Uint(id.as_u256())];
        let start = self.governor_uint(&governor::proposal_snapshot(), &arg).await?;
        let end = self.governor_uint(&governor::proposal_deadline(), &arg).await?;
        Ok(VotingWindow::new(
            to_u64(start, "proposalSnapshot")?,
            to_u64(end, "proposalDeadline")?,
        ))
    }

    pub async fn has_voted(&self, id: ProposalId, account: Address) -> Result<bool, OrchestratorError> {
        let function = governor::has_voted();
        let data = function
            .encode_input(&[Token::Uint(id.as_u256()), Token::Address(account)])
            .map_err(abi)?;
        let output = self.ledger.call(&CallMsg::new(self.governor, data), None).await?;
        decode_bool(&function, &output).map_err(abi)
    }

    /// Read everything the decision engine needs about `id` for `account`.
    ///
    /// The window is read once voting has been scheduled past `Pending`, and
    /// the voter receipt only while the proposal is `Active`.
    pub async fn snapshot(
        &self,
        id: ProposalId,
        account: Address,
    ) -> Result<Observation, OrchestratorError> {
        async {
            let state = self.read_state(id).await?;
            let head = self.head().await?;
            let window = match state {
                ObservedState::Known(s) if s.has_voting_window() => Some(self.read_window(id).await?),
                _ => None,
            };
            let has_voted = match state {
                ObservedState::Known(ProposalState::Active) => self.has_voted(id, account).await?,
                _ => false,
            };
            tracing::debug!(state = ?state, head, ?window, has_voted, "observed proposal");
            Ok(Observation {
                proposal_id: id,
                state,
                window,
                head,
                has_voted,
            })
        }
        .instrument(observe_span(&id.to_string()))
        .await
    }

    /// `votingDelay()` in blocks.
    pub async fn voting_delay(&self) -> Result<u64, OrchestratorError> {
        let value = self.governor_uint(&governor::voting_delay(), &[]).await?;
        to_u64(value, "votingDelay")
    }

    /// `votingPeriod()` in blocks.
    pub async fn voting_period(&self) -> Result<u64, OrchestratorError> {
        let value = self.governor_uint(&governor::voting_period(), &[]).await?;
        to_u64(value, "votingPeriod")
    }

    pub async fn balance_of(&self, account: Address) -> Result<TokenAmount, OrchestratorError> {
        let token = self.token()?;
        let value = self
            .uint_call(token, &token::balance_of(), &[Token::Address(account)])
            .await?;
        Ok(TokenAmount::new(value))
    }

    /// Current voting power of `account`.
    pub async fn votes_of(&self, account: Address) -> Result<TokenAmount, OrchestratorError> {
        let token = self.token()?;
        let value = self
            .uint_call(token, &token::get_votes(), &[Token::Address(account)])
            .await?;
        Ok(TokenAmount::new(value))
    }

    async fn governor_uint(&self, function: &Function, args: &[Token]) -> Result<U256, OrchestratorError> {
        self.uint_call(self.governor, function, args).await
    }

    async fn uint_call(
        &self,
        to: Address,
        function: &Function,
        args: &[Token],
    ) -> Result<U256, OrchestratorError> {
        let data = function.encode_input(args).map_err(abi)?;
        let output = self.ledger.call(&CallMsg::new(to, data), None).await?;
        decode_uint(function, &output).map_err(abi)
    }
}

fn abi(err: AbiError) -> OrchestratorError {
    LedgerError::Decode(err.to_string()).into()
}

fn to_u64(value: U256, what: &str) -> Result<u64, OrchestratorError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::Decode(format!("{what} value {value} does not fit a block height")).into())
}
