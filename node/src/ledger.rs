//! The ledger seam.
//!
//! [`Ledger`] is the only way the orchestrator touches the chain. The
//! production implementation is [`crate::RpcLedger`]; tests use the
//! in-memory ledger from `govctl-nullables`.

use async_trait::async_trait;
use govctl_abi::RevertReason;
use govctl_types::{Address, BlockNumber, Bytes, TxHash, B256, U256};
use thiserror::Error;

/// A read-only call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallMsg {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl CallMsg {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from: None,
            to,
            data: data.into(),
            value: U256::ZERO,
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// A state-changing call for the ledger to sign and broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    /// Fixed gas limit; estimated by the ledger when absent.
    pub gas_limit: Option<u64>,
}

impl TxRequest {
    /// The same call as a read, for replaying a revert.
    pub fn as_call(&self) -> CallMsg {
        CallMsg {
            from: Some(self.from),
            to: self.to,
            data: self.data.clone(),
            value: self.value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// An inclusion receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: BlockNumber,
    pub success: bool,
    pub logs: Vec<LogEntry>,
    /// The receipt as the node reported it, kept for manual recovery.
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The node could not be reached or answered garbage at the HTTP level.
    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    /// The node refused the request (bad params, funds, nonce, gas price).
    #[error("ledger rejected request: {0}")]
    Rejected(String),

    /// The contract reverted the call.
    #[error("execution reverted: {reason}")]
    Reverted { reason: RevertReason },

    #[error("unexpected ledger response: {0}")]
    Decode(String),

    #[error("signer error: {0}")]
    Signer(String),
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current head height.
    async fn block_number(&self) -> Result<BlockNumber, LedgerError>;

    /// Execute a read-only call at `block` (latest when `None`).
    async fn call(&self, msg: &CallMsg, block: Option<BlockNumber>) -> Result<Bytes, LedgerError>;

    /// Sign and broadcast; returns once the node has accepted the transaction
    /// into its pool.
    async fn send_transaction(&self, request: &TxRequest) -> Result<TxHash, LedgerError>;

    /// `None` while the transaction is not yet included.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, LedgerError>;
}
