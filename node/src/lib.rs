//! govctl orchestrator: drives a Governor proposal through its lifecycle.
//!
//! The orchestrator is the coordinator that:
//! - Reads proposal state, voting window and head from the Governor
//! - Asks the decision engine for the next legal step
//! - Signs, submits and waits for transactions, cancellably
//! - Extracts results from receipts by event name
//! - Reports every step through a [`ReportSink`]

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod reader;
pub mod report;
pub mod rpc_ledger;
pub mod shutdown;
pub mod submitter;
pub mod tracing_spans;

pub use config::{Credential, OrchestratorConfig};
pub use error::OrchestratorError;
pub use ledger::{CallMsg, Ledger, LedgerError, LogEntry, Receipt, TxRequest};
pub use logging::{init_logging, LogFormat};
pub use orchestrator::{Contracts, Orchestrator, Outcome, DEFAULT_VOTE_REASON};
pub use reader::{StateReader, TimeEstimate};
pub use report::{Report, ReportSink, TracingSink};
pub use rpc_ledger::RpcLedger;
pub use shutdown::ShutdownController;
pub use submitter::{find_event, Submission, Submitter, SubmitterSettings};
