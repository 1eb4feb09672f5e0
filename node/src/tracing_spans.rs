//! Pre-built [`tracing::Span`] constructors for govctl flows.
//!
//! Consistent span names and field sets make it easy to filter the JSON logs
//! of one invocation by proposal or by transaction.

use tracing::{info_span, Span};

/// Span covering one lifecycle flow (propose, vote, execute, ...).
pub fn flow_span(action: &str, proposal_id: &str) -> Span {
    info_span!("flow", action = %action, proposal_id = %proposal_id)
}

/// Span covering the read of a proposal's state, window and head.
pub fn observe_span(proposal_id: &str) -> Span {
    info_span!("observe", proposal_id = %proposal_id)
}

/// Span covering signing and broadcasting one transaction.
pub fn submit_span(action: &str, to: &str) -> Span {
    info_span!("submit", action = %action, to = %to)
}

/// Span covering the confirmation wait of one transaction.
pub fn confirm_span(tx_hash: &str) -> Span {
    info_span!("confirm", tx_hash = %tx_hash)
}
