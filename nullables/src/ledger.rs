//! Nullable ledger: an in-memory Governor and ERC20Votes token.
//!
//! Implements the orchestrator's [`Ledger`] seam without a node. Calls are
//! routed by selector through the same ABI definitions the orchestrator
//! uses, so a selector or layout mistake shows up here exactly as it would
//! against a real contract. Every accepted transaction is recorded.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use govctl_abi::{decode, encode, Function, RevertReason, Token};
use govctl_crypto::keccak256;
use govctl_governance::contract::{governor, token};
use govctl_node::{CallMsg, Ledger, LedgerError, LogEntry, Receipt, TxRequest};
use govctl_types::{
    Address, BlockNumber, Bytes, ProposalId, ProposalState, TokenAmount, TxHash, B256, U256,
};
use serde_json::json;

/// Revert messages of the OpenZeppelin Governor this ledger imitates.
pub const UNKNOWN_PROPOSAL: &str = "Governor: unknown proposal id";
pub const VOTE_NOT_ACTIVE: &str = "Governor: vote not currently active";
pub const VOTE_ALREADY_CAST: &str = "GovernorVotingSimple: vote already cast";
pub const PROPOSAL_NOT_SUCCESSFUL: &str = "Governor: proposal not successful";
pub const PROPOSAL_EXISTS: &str = "Governor: proposal already exists";

#[derive(Clone, Debug)]
struct NullProposal {
    ordinal: u8,
    /// Overrides the `state()` word, for malformed responses.
    raw_state: Option<U256>,
    snapshot: BlockNumber,
    deadline: BlockNumber,
    voters: HashSet<Address>,
}

struct Chain {
    governor: Address,
    token: Address,
    head: BlockNumber,
    voting_delay: u64,
    voting_period: u64,
    proposals: HashMap<ProposalId, NullProposal>,
    balances: HashMap<Address, U256>,
    votes: HashMap<Address, U256>,
    delegates: HashMap<Address, Address>,
    sent: Vec<TxRequest>,
    receipts: HashMap<TxHash, Receipt>,
    replays: HashMap<(Address, Bytes), RevertReason>,
    polls_until_included: u32,
    pending_polls: HashMap<TxHash, u32>,
    blocks_per_poll: u64,
    unreachable_polls: u32,
    next_send_error: Option<LedgerError>,
    forced_revert: Option<RevertReason>,
    omit_logs: bool,
    tx_counter: u64,
}

/// In-memory ledger for tests.
///
/// State only changes when a test scripts it or a simulated transaction
/// applies it.
pub struct NullLedger {
    chain: Mutex<Chain>,
}

impl NullLedger {
    pub fn new(governor: Address, token: Address) -> Self {
        Self {
            chain: Mutex::new(Chain {
                governor,
                token,
                head: 1,
                voting_delay: 1,
                voting_period: 50,
                proposals: HashMap::new(),
                balances: HashMap::new(),
                votes: HashMap::new(),
                delegates: HashMap::new(),
                sent: Vec::new(),
                receipts: HashMap::new(),
                replays: HashMap::new(),
                polls_until_included: 0,
                pending_polls: HashMap::new(),
                blocks_per_poll: 0,
                unreachable_polls: 0,
                next_send_error: None,
                forced_revert: None,
                omit_logs: false,
                tx_counter: 0,
            }),
        }
    }

    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Scripting ──────────────────────────────────────────────────────

    /// Register a proposal directly, bypassing `propose`.
    pub fn insert_proposal(&self, id: ProposalId, state: ProposalState, snapshot: BlockNumber, deadline: BlockNumber) {
        self.chain().proposals.insert(
            id,
            NullProposal {
                ordinal: state.ordinal(),
                raw_state: None,
                snapshot,
                deadline,
                voters: HashSet::new(),
            },
        );
    }

    pub fn set_state(&self, id: ProposalId, state: ProposalState) {
        self.set_ordinal(id, state.ordinal());
    }

    /// Report a raw ordinal, including ones the Governor enum does not define.
    pub fn set_ordinal(&self, id: ProposalId, ordinal: u8) {
        if let Some(p) = self.chain().proposals.get_mut(&id) {
            p.ordinal = ordinal;
            p.raw_state = None;
        }
    }

    /// Answer `state()` with an arbitrary word, such as one wider than `uint8`.
    pub fn set_raw_state(&self, id: ProposalId, value: U256) {
        if let Some(p) = self.chain().proposals.get_mut(&id) {
            p.raw_state = Some(value);
        }
    }

    pub fn mark_voted(&self, id: ProposalId, voter: Address) {
        if let Some(p) = self.chain().proposals.get_mut(&id) {
            p.voters.insert(voter);
        }
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.chain().head = head;
    }

    pub fn advance(&self, blocks: u64) {
        self.chain().head += blocks;
    }

    pub fn set_voting_delay(&self, blocks: u64) {
        self.chain().voting_delay = blocks;
    }

    pub fn set_voting_period(&self, blocks: u64) {
        self.chain().voting_period = blocks;
    }

    pub fn set_balance(&self, account: Address, amount: TokenAmount) {
        self.chain().balances.insert(account, amount.raw());
    }

    pub fn set_votes(&self, account: Address, amount: TokenAmount) {
        self.chain().votes.insert(account, amount.raw());
    }

    /// Number of receipt polls that return `None` before inclusion shows.
    /// `u32::MAX` keeps every transaction pending forever.
    pub fn set_polls_until_included(&self, polls: u32) {
        self.chain().polls_until_included = polls;
    }

    /// Head advance per receipt poll.
    pub fn set_blocks_per_poll(&self, blocks: u64) {
        self.chain().blocks_per_poll = blocks;
    }

    /// The next `polls` receipt polls fail as if the node were down.
    pub fn fail_receipt_polls(&self, polls: u32) {
        self.chain().unreachable_polls = polls;
    }

    /// The next `send_transaction` fails with `error` and is not recorded.
    pub fn fail_next_send(&self, error: LedgerError) {
        self.chain().next_send_error = Some(error);
    }

    /// The next write reverts with `reason` whatever the simulated state.
    pub fn force_revert_next(&self, reason: RevertReason) {
        self.chain().forced_revert = Some(reason);
    }

    /// Strip logs from receipts, as a node with a broken log index would.
    pub fn omit_logs(&self) {
        self.chain().omit_logs = true;
    }

    // ── Observation ────────────────────────────────────────────────────

    /// Every transaction accepted for broadcast, in order.
    pub fn sent(&self) -> Vec<TxRequest> {
        self.chain().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.chain().sent.len()
    }

    pub fn head(&self) -> BlockNumber {
        self.chain().head
    }

    pub fn balance(&self, account: Address) -> TokenAmount {
        TokenAmount::new(self.chain().balances.get(&account).copied().unwrap_or_default())
    }

    pub fn state_ordinal(&self, id: ProposalId) -> Option<u8> {
        self.chain().proposals.get(&id).map(|p| p.ordinal)
    }

    pub fn has_voted(&self, id: ProposalId, voter: Address) -> bool {
        self.chain()
            .proposals
            .get(&id)
            .is_some_and(|p| p.voters.contains(&voter))
    }
}

#[async_trait]
impl Ledger for NullLedger {
    async fn block_number(&self) -> Result<BlockNumber, LedgerError> {
        Ok(self.chain().head)
    }

    async fn call(&self, msg: &CallMsg, block: Option<BlockNumber>) -> Result<Bytes, LedgerError> {
        let chain = self.chain();
        if block.is_some() {
            if let Some(reason) = chain.replays.get(&(msg.to, msg.data.clone())) {
                return Err(LedgerError::Reverted {
                    reason: reason.clone(),
                });
            }
        }
        chain.read(msg).map(Bytes::from)
    }

    async fn send_transaction(&self, request: &TxRequest) -> Result<TxHash, LedgerError> {
        let mut chain = self.chain();
        if let Some(err) = chain.next_send_error.take() {
            return Err(err);
        }

        let outcome = match chain.forced_revert.take() {
            Some(reason) => Err(reason),
            None => chain.simulate(request),
        };
        let logs = match outcome {
            Ok(logs) => Some(logs),
            // Without a fixed gas limit the node's estimate hits the revert
            // before anything is broadcast.
            Err(reason) if request.gas_limit.is_none() => {
                return Err(LedgerError::Reverted { reason })
            }
            Err(reason) => {
                chain
                    .replays
                    .insert((request.to, request.data.clone()), reason);
                None
            }
        };

        chain.tx_counter += 1;
        chain.head += 1;
        let tx_hash = TxHash::from(keccak256(
            [chain.tx_counter.to_be_bytes().as_slice(), request.data.as_ref()].concat(),
        ));
        let omit_logs = chain.omit_logs;
        let logs = logs.map(|logs| if omit_logs { Vec::new() } else { logs });
        let receipt = build_receipt(tx_hash, chain.head, logs);
        chain.receipts.insert(tx_hash, receipt);
        let polls = chain.polls_until_included;
        chain.pending_polls.insert(tx_hash, polls);
        chain.sent.push(request.clone());
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, LedgerError> {
        let mut chain = self.chain();
        if chain.unreachable_polls > 0 {
            chain.unreachable_polls -= 1;
            return Err(LedgerError::Unreachable("connection refused".into()));
        }
        let step = chain.blocks_per_poll;
        chain.head += step;
        match chain.pending_polls.get_mut(&tx_hash) {
            Some(0) => {}
            Some(remaining) => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Ok(None);
            }
            None => return Ok(None),
        }
        Ok(chain.receipts.get(&tx_hash).cloned())
    }
}

impl Chain {
    fn read(&self, msg: &CallMsg) -> Result<Vec<u8>, LedgerError> {
        let (selector, args) = split_selector(&msg.data)?;
        if msg.to == self.governor {
            self.read_governor(selector, args)
        } else if msg.to == self.token {
            self.read_token(selector, args)
        } else {
            // No code at the address.
            Ok(Vec::new())
        }
    }

    fn read_governor(&self, selector: [u8; 4], args: &[u8]) -> Result<Vec<u8>, LedgerError> {
        if selector == governor::state().selector() {
            let p = self.proposal(&governor::state(), args)?;
            return Ok(word(p.raw_state.unwrap_or(U256::from(p.ordinal))));
        }
        if selector == governor::proposal_snapshot().selector() {
            let p = self.proposal(&governor::proposal_snapshot(), args)?;
            return Ok(word(U256::from(p.snapshot)));
        }
        if selector == governor::proposal_deadline().selector() {
            let p = self.proposal(&governor::proposal_deadline(), args)?;
            return Ok(word(U256::from(p.deadline)));
        }
        if selector == governor::has_voted().selector() {
            let tokens = decode_args(&governor::has_voted(), args)?;
            let voter = tokens[1].as_address().unwrap_or_default();
            let voted = self
                .lookup(&tokens[0])
                .is_some_and(|p| p.voters.contains(&voter));
            return Ok(encode(&[Token::Bool(voted)]));
        }
        if selector == governor::voting_delay().selector() {
            return Ok(word(U256::from(self.voting_delay)));
        }
        if selector == governor::voting_period().selector() {
            return Ok(word(U256::from(self.voting_period)));
        }
        Err(revert_empty())
    }

    fn read_token(&self, selector: [u8; 4], args: &[u8]) -> Result<Vec<u8>, LedgerError> {
        if selector == token::balance_of().selector() {
            let account = single_address(&token::balance_of(), args)?;
            return Ok(word(self.balances.get(&account).copied().unwrap_or_default()));
        }
        if selector == token::get_votes().selector() {
            let account = single_address(&token::get_votes(), args)?;
            return Ok(word(self.votes.get(&account).copied().unwrap_or_default()));
        }
        Err(revert_empty())
    }

    fn lookup(&self, id: &Token) -> Option<&NullProposal> {
        id.as_uint()
            .and_then(|id| self.proposals.get(&ProposalId::new(id)))
    }

    fn proposal(&self, function: &Function, args: &[u8]) -> Result<&NullProposal, LedgerError> {
        let tokens = decode_args(function, args)?;
        self.lookup(&tokens[0]).ok_or_else(|| revert(UNKNOWN_PROPOSAL))
    }

    /// Apply a write. Returns the logs it emits or the revert reason.
    fn simulate(&mut self, request: &TxRequest) -> Result<Vec<LogEntry>, RevertReason> {
        let (selector, args) = split_selector(&request.data).map_err(|_| RevertReason::Empty)?;
        if request.to == self.governor {
            if selector == governor::propose().selector() {
                return self.propose(request.from, args);
            }
            if selector == governor::cast_vote_with_reason().selector() {
                return self.cast_vote(request.from, args);
            }
            if selector == governor::execute().selector() {
                return self.execute(args);
            }
        } else if request.to == self.token && selector == token::delegate_fn().selector() {
            return self.delegate(request.from, args);
        }
        Err(RevertReason::Empty)
    }

    fn propose(&mut self, proposer: Address, args: &[u8]) -> Result<Vec<LogEntry>, RevertReason> {
        let tokens = decode(&governor::propose().inputs, args).map_err(|_| RevertReason::Empty)?;
        let description = tokens[3].as_str().unwrap_or_default().to_string();
        let id = hash_proposal(&tokens[..3], keccak256(description.as_bytes()));
        if self.proposals.contains_key(&id) {
            return Err(RevertReason::Error(PROPOSAL_EXISTS.into()));
        }

        // The proposal is mined in the next block.
        let snapshot = self.head + 1 + self.voting_delay;
        let deadline = snapshot + self.voting_period;
        self.proposals.insert(
            id,
            NullProposal {
                ordinal: ProposalState::Pending.ordinal(),
                raw_state: None,
                snapshot,
                deadline,
                voters: HashSet::new(),
            },
        );

        let signatures = vec![Token::String(String::new()); tokens[0].as_array().map_or(0, <[Token]>::len)];
        let data = encode(&[
            Token::Uint(id.as_u256()),
            Token::Address(proposer),
            tokens[0].clone(),
            tokens[1].clone(),
            Token::Array(signatures),
            tokens[2].clone(),
            Token::Uint(U256::from(snapshot)),
            Token::Uint(U256::from(deadline)),
            Token::String(description),
        ]);
        Ok(vec![LogEntry {
            address: self.governor,
            topics: vec![governor::proposal_created().topic()],
            data: data.into(),
        }])
    }

    fn cast_vote(&mut self, voter: Address, args: &[u8]) -> Result<Vec<LogEntry>, RevertReason> {
        let tokens = decode(&governor::cast_vote_with_reason().inputs, args).map_err(|_| RevertReason::Empty)?;
        let id = ProposalId::new(tokens[0].as_uint().unwrap_or_default());
        let weight = self
            .votes
            .get(&voter)
            .copied()
            .unwrap_or_default();
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| RevertReason::Error(UNKNOWN_PROPOSAL.into()))?;
        if proposal.ordinal != ProposalState::Active.ordinal() {
            return Err(RevertReason::Error(VOTE_NOT_ACTIVE.into()));
        }
        if !proposal.voters.insert(voter) {
            return Err(RevertReason::Error(VOTE_ALREADY_CAST.into()));
        }

        let data = encode(&[
            tokens[0].clone(),
            tokens[1].clone(),
            Token::Uint(weight),
            tokens[2].clone(),
        ]);
        Ok(vec![LogEntry {
            address: self.governor,
            topics: vec![governor::vote_cast().topic(), address_topic(voter)],
            data: data.into(),
        }])
    }

    fn execute(&mut self, args: &[u8]) -> Result<Vec<LogEntry>, RevertReason> {
        let tokens = decode(&governor::execute().inputs, args).map_err(|_| RevertReason::Empty)?;
        let description_hash = tokens[3]
            .as_bytes()
            .map(B256::from_slice)
            .ok_or(RevertReason::Empty)?;
        let id = hash_proposal(&tokens[..3], description_hash);
        let ordinal = self
            .proposals
            .get(&id)
            .map(|p| p.ordinal)
            .ok_or_else(|| RevertReason::Error(UNKNOWN_PROPOSAL.into()))?;
        let executable = [ProposalState::Succeeded.ordinal(), ProposalState::Queued.ordinal()];
        if !executable.contains(&ordinal) {
            return Err(RevertReason::Error(PROPOSAL_NOT_SUCCESSFUL.into()));
        }

        let targets = tokens[0].as_array().unwrap_or_default().to_vec();
        let calldatas = tokens[2].as_array().unwrap_or_default().to_vec();
        for (target, calldata) in targets.iter().zip(&calldatas) {
            let (Some(target), Some(calldata)) = (target.as_address(), calldata.as_bytes()) else {
                continue;
            };
            if target == self.token {
                self.apply_token_call(calldata)?;
            }
        }
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.ordinal = ProposalState::Executed.ordinal();
        }

        Ok(vec![LogEntry {
            address: self.governor,
            topics: vec![governor::proposal_executed().topic()],
            data: encode(&[Token::Uint(id.as_u256())]).into(),
        }])
    }

    /// Calls the Governor makes on the token while executing.
    fn apply_token_call(&mut self, calldata: &[u8]) -> Result<(), RevertReason> {
        let (selector, args) = split_selector(calldata).map_err(|_| RevertReason::Empty)?;
        if selector != token::mint_fn().selector() {
            return Err(RevertReason::Empty);
        }
        let tokens = decode(&token::mint_fn().inputs, args).map_err(|_| RevertReason::Empty)?;
        let (Some(to), Some(amount)) = (tokens[0].as_address(), tokens[1].as_uint()) else {
            return Err(RevertReason::Empty);
        };
        let balance = self.balances.entry(to).or_default();
        *balance += amount;
        Ok(())
    }

    fn delegate(&mut self, delegator: Address, args: &[u8]) -> Result<Vec<LogEntry>, RevertReason> {
        let tokens = decode(&token::delegate_fn().inputs, args).map_err(|_| RevertReason::Empty)?;
        let delegatee = tokens[0].as_address().ok_or(RevertReason::Empty)?;
        let previous = self.delegates.insert(delegator, delegatee).unwrap_or_default();
        let balance = self.balances.get(&delegator).copied().unwrap_or_default();
        if previous != Address::ZERO && previous != delegatee {
            let old = self.votes.entry(previous).or_default();
            *old = old.saturating_sub(balance);
        }
        if previous != delegatee {
            *self.votes.entry(delegatee).or_default() += balance;
        }
        Ok(vec![LogEntry {
            address: self.token,
            topics: vec![
                token::delegate_changed().topic(),
                address_topic(delegator),
                address_topic(previous),
                address_topic(delegatee),
            ],
            data: Bytes::new(),
        }])
    }
}

/// `hashProposal`: the encoded (targets, values, calldatas) arrays plus the
/// description hash.
fn hash_proposal(arrays: &[Token], description_hash: B256) -> ProposalId {
    let mut tokens = arrays.to_vec();
    tokens.push(Token::FixedBytes(description_hash.to_vec()));
    ProposalId::from_digest(keccak256(encode(&tokens)))
}

fn build_receipt(tx_hash: TxHash, block: BlockNumber, logs: Option<Vec<LogEntry>>) -> Receipt {
    let success = logs.is_some();
    let logs = logs.unwrap_or_default();
    let raw_logs: Vec<_> = logs
        .iter()
        .map(|log| {
            json!({
                "address": log.address,
                "topics": log.topics,
                "data": log.data,
            })
        })
        .collect();
    Receipt {
        tx_hash,
        block_number: block,
        success,
        raw: json!({
            "transactionHash": tx_hash.as_b256(),
            "blockNumber": format!("0x{block:x}"),
            "status": if success { "0x1" } else { "0x0" },
            "logs": raw_logs,
        }),
        logs,
    }
}

fn split_selector(data: &[u8]) -> Result<([u8; 4], &[u8]), LedgerError> {
    if data.len() < 4 {
        return Err(revert_empty());
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    Ok((selector, &data[4..]))
}

fn decode_args(function: &Function, args: &[u8]) -> Result<Vec<Token>, LedgerError> {
    decode(&function.inputs, args).map_err(|_| revert_empty())
}

fn single_address(function: &Function, args: &[u8]) -> Result<Address, LedgerError> {
    decode_args(function, args)?[0]
        .as_address()
        .ok_or_else(revert_empty)
}

fn word(value: U256) -> Vec<u8> {
    encode(&[Token::Uint(value)])
}

fn address_topic(address: Address) -> B256 {
    B256::left_padding_from(address.as_slice())
}

fn revert(message: &str) -> LedgerError {
    LedgerError::Reverted {
        reason: RevertReason::Error(message.to_string()),
    }
}

fn revert_empty() -> LedgerError {
    LedgerError::Reverted {
        reason: RevertReason::Empty,
    }
}
