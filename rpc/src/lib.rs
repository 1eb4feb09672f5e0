//! Ethereum JSON-RPC client for govctl.
//!
//! Only the handful of methods the orchestrator uses are wrapped. Errors are
//! classified so callers can tell a transport failure from a node rejection
//! from an execution revert.

pub mod client;
pub mod error;
pub mod types;

pub use client::{parse_response, EthClient};
pub use error::RpcError;
pub use types::{BlockTag, CallRequest, Log, TransactionReceipt};
