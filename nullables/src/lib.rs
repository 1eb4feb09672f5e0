//! Nullable infrastructure for deterministic testing.
//!
//! The orchestrator's external dependencies (the chain and the report
//! output) sit behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be scripted programmatically
//! - Never touch the network
//!
//! Usage: swap [`NullLedger`] in for `RpcLedger` and [`RecordingSink`] in for
//! the console in tests.

pub mod ledger;
pub mod sink;

pub use ledger::NullLedger;
pub use sink::RecordingSink;
