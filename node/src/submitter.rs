//! Transaction Submitter: sign, broadcast, wait, classify.
//!
//! A submission blocks the flow until the receipt is included with the
//! configured number of confirmations. The wait polls the ledger and can be
//! cancelled through the [`ShutdownController`]; nothing is recorded locally
//! before confirmation, so a cancelled wait leaves no partial state behind.

use std::sync::Arc;
use std::time::Duration;

use govctl_abi::{DecodedEvent, Event};
use govctl_types::{Address, BlockNumber, Bytes, TxHash, U256};
use tracing::Instrument;

use crate::ledger::{Ledger, LedgerError, Receipt, TxRequest};
use crate::report::{Report, ReportSink};
use crate::shutdown::ShutdownController;
use crate::tracing_spans::{confirm_span, submit_span};
use crate::OrchestratorError;

/// A state-changing call the orchestrator wants on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Short verb used in reports and errors ("propose", "vote", ...).
    pub action: &'static str,
    pub to: Address,
    pub calldata: Bytes,
    pub value: U256,
}

impl Submission {
    pub fn new(action: &'static str, to: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            action,
            to,
            calldata: calldata.into(),
            value: U256::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitterSettings {
    pub poll_interval: Duration,
    /// Blocks, inclusion block counted, before a receipt is final enough.
    pub confirmations: u64,
    pub gas_limit: Option<u64>,
}

impl Default for SubmitterSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            confirmations: 1,
            gas_limit: None,
        }
    }
}

pub struct Submitter {
    ledger: Arc<dyn Ledger>,
    from: Address,
    settings: SubmitterSettings,
    shutdown: ShutdownController,
}

impl Submitter {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        from: Address,
        settings: SubmitterSettings,
        shutdown: ShutdownController,
    ) -> Self {
        Self {
            ledger,
            from,
            settings,
            shutdown,
        }
    }

    /// The account transactions are sent from.
    pub fn from(&self) -> Address {
        self.from
    }

    /// Submit and wait for confirmation.
    ///
    /// Returns the receipt of a successful transaction. An included revert is
    /// replayed at its block to recover the reason, which is passed through
    /// verbatim.
    pub async fn submit(
        &self,
        submission: &Submission,
        sink: &dyn ReportSink,
    ) -> Result<Receipt, OrchestratorError> {
        let action = submission.action;
        let request = TxRequest {
            from: self.from,
            to: submission.to,
            data: submission.calldata.clone(),
            value: submission.value,
            gas_limit: self.settings.gas_limit,
        };

        let tx_hash = self
            .ledger
            .send_transaction(&request)
            .instrument(submit_span(action, &submission.to.to_string()))
            .await
            .map_err(|e| classify_send_error(action, e))?;
        tracing::info!(action, %tx_hash, "transaction submitted");
        sink.report(&Report::Submitted {
            action: action.to_string(),
            tx_hash,
        });

        let receipt = self
            .wait_for_confirmation(action, tx_hash, sink)
            .instrument(confirm_span(&tx_hash.to_string()))
            .await?;

        if !receipt.success {
            let reason = self.replay_revert(&request, receipt.block_number).await;
            tracing::warn!(action, %tx_hash, block = receipt.block_number, %reason, "transaction reverted");
            return Err(OrchestratorError::RemoteRevert {
                action: action.to_string(),
                tx_hash: Some(tx_hash),
                reason,
            });
        }

        sink.report(&Report::Confirmed {
            action: action.to_string(),
            tx_hash,
            block: receipt.block_number,
        });
        Ok(receipt)
    }

    /// Poll until `tx_hash` has the configured confirmations or the wait is
    /// cancelled. No timeout; wrap the call to impose one.
    pub async fn wait_for_confirmation(
        &self,
        action: &str,
        tx_hash: TxHash,
        sink: &dyn ReportSink,
    ) -> Result<Receipt, OrchestratorError> {
        let required = self.settings.confirmations.max(1);
        let mut shutdown = self.shutdown.subscribe();
        let cancelled = || OrchestratorError::Cancelled {
            action: action.to_string(),
            tx_hash,
        };

        loop {
            if self.shutdown.is_triggered() {
                return Err(cancelled());
            }

            match self.poll(tx_hash).await {
                Ok(Some((receipt, confirmations))) if confirmations >= required => {
                    tracing::debug!(%tx_hash, block = receipt.block_number, confirmations, "confirmed");
                    return Ok(receipt);
                }
                Ok(progress) => {
                    let confirmations = progress.map_or(0, |(_, c)| c);
                    tracing::debug!(%tx_hash, confirmations, required, "waiting for confirmation");
                    sink.report(&Report::Waiting {
                        tx_hash,
                        confirmations,
                        required,
                    });
                }
                Err(LedgerError::Unreachable(e)) => {
                    tracing::warn!(%tx_hash, error = %e, "receipt poll failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::select! {
                _ = shutdown.recv() => return Err(cancelled()),
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    async fn poll(&self, tx_hash: TxHash) -> Result<Option<(Receipt, u64)>, LedgerError> {
        let Some(receipt) = self.ledger.receipt(tx_hash).await? else {
            return Ok(None);
        };
        let head = self.ledger.block_number().await?;
        let confirmations = confirmations_at(receipt.block_number, head);
        Ok(Some((receipt, confirmations)))
    }

    async fn replay_revert(&self, request: &TxRequest, block: BlockNumber) -> String {
        match self.ledger.call(&request.as_call(), Some(block)).await {
            Err(LedgerError::Reverted { reason }) => reason.to_string(),
            Ok(_) => format!("reverted in block {block}; replay succeeded so the reason is unavailable"),
            Err(e) => format!("reverted in block {block}; reason unavailable: {e}"),
        }
    }
}

/// Blocks since inclusion, the inclusion block counted.
fn confirmations_at(included: BlockNumber, head: BlockNumber) -> u64 {
    if head >= included {
        head - included + 1
    } else {
        0
    }
}

fn classify_send_error(action: &str, err: LedgerError) -> OrchestratorError {
    match err {
        LedgerError::Reverted { reason } => OrchestratorError::RemoteRevert {
            action: action.to_string(),
            tx_hash: None,
            reason: reason.to_string(),
        },
        LedgerError::Rejected(message) | LedgerError::Signer(message) => {
            OrchestratorError::SubmissionRejected {
                action: action.to_string(),
                message,
            }
        }
        other => other.into(),
    }
}

/// Find and decode `event` emitted by `emitter`, matching by signature and
/// never by log position.
pub fn find_event(
    receipt: &Receipt,
    emitter: Address,
    event: &Event,
) -> Result<DecodedEvent, OrchestratorError> {
    let decoded = receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter && event.matches(&log.topics))
        .find_map(|log| match event.decode_log(&log.topics, &log.data) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(event = %event.name, error = %e, "skipping undecodable log");
                None
            }
        });
    decoded.ok_or_else(|| OrchestratorError::MissingEvent {
        tx_hash: receipt.tx_hash,
        event: event.name.clone(),
        raw_receipt: receipt.raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LogEntry;
    use govctl_abi::RevertReason;
    use govctl_governance::contract::governor;

    #[test]
    fn confirmation_count_includes_inclusion_block() {
        assert_eq!(confirmations_at(10, 10), 1);
        assert_eq!(confirmations_at(10, 12), 3);
        assert_eq!(confirmations_at(10, 9), 0);
    }

    #[test]
    fn send_errors_are_classified() {
        let err = classify_send_error(
            "execute",
            LedgerError::Reverted {
                reason: RevertReason::Error("Governor: proposal not successful".into()),
            },
        );
        assert!(matches!(
            err,
            OrchestratorError::RemoteRevert { tx_hash: None, ref reason, .. }
                if reason == "Governor: proposal not successful"
        ));

        let err = classify_send_error("vote", LedgerError::Rejected("nonce too low".into()));
        assert!(matches!(err, OrchestratorError::SubmissionRejected { .. }));
        assert!(err.is_retry_safe());

        let err = classify_send_error("vote", LedgerError::Unreachable("refused".into()));
        assert!(matches!(err, OrchestratorError::Ledger(LedgerError::Unreachable(_))));
    }

    #[test]
    fn missing_event_keeps_raw_receipt() {
        let receipt = Receipt {
            tx_hash: TxHash::ZERO,
            block_number: 7,
            success: true,
            logs: vec![LogEntry {
                address: Address::ZERO,
                topics: vec![governor::vote_cast().topic()],
                data: Bytes::new(),
            }],
            raw: serde_json::json!({"blockNumber": "0x7", "logs": []}),
        };
        let err = find_event(&receipt, Address::ZERO, &governor::proposal_created()).unwrap_err();
        match err {
            OrchestratorError::MissingEvent {
                event, raw_receipt, ..
            } => {
                assert_eq!(event, "ProposalCreated");
                assert!(raw_receipt.contains("\"blockNumber\":\"0x7\""));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
