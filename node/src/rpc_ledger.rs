//! [`Ledger`] over an Ethereum JSON-RPC endpoint.
//!
//! Reads go through `eth_call`. Writes are signed locally as EIP-155 legacy
//! transactions by the configured [`Signer`] and broadcast with
//! `eth_sendRawTransaction`.

use async_trait::async_trait;
use govctl_abi::{decode_revert, RevertReason};
use govctl_rpc::{BlockTag, CallRequest, EthClient, RpcError, TransactionReceipt};
use govctl_types::{BlockNumber, Bytes, TxHash};
use govctl_wallet_core::{LegacyTransaction, Signer};
use tokio::sync::OnceCell;

use crate::ledger::{CallMsg, Ledger, LedgerError, LogEntry, Receipt, TxRequest};

/// Headroom added on top of `eth_estimateGas`, in percent.
const GAS_HEADROOM_PERCENT: u64 = 20;

pub struct RpcLedger {
    client: EthClient,
    signer: Option<Signer>,
    chain_id: OnceCell<u64>,
}

impl RpcLedger {
    /// A read-only ledger; `send_transaction` fails with a signer error.
    pub fn new(client: EthClient) -> Self {
        Self {
            client,
            signer: None,
            chain_id: OnceCell::new(),
        }
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    async fn chain_id(&self) -> Result<u64, LedgerError> {
        self.chain_id
            .get_or_try_init(|| async { self.client.chain_id().await.map_err(classify) })
            .await
            .copied()
    }

    async fn gas_limit(&self, request: &TxRequest) -> Result<u64, LedgerError> {
        if let Some(limit) = request.gas_limit {
            return Ok(limit);
        }
        let estimate = self
            .client
            .estimate_gas(&to_call_request(&request.as_call()))
            .await
            .map_err(classify)?;
        let estimate = u64::try_from(estimate).unwrap_or(u64::MAX);
        Ok(with_headroom(estimate))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn block_number(&self) -> Result<BlockNumber, LedgerError> {
        self.client.block_number().await.map_err(classify)
    }

    async fn call(&self, msg: &CallMsg, block: Option<BlockNumber>) -> Result<Bytes, LedgerError> {
        let tag = block.map_or(BlockTag::Latest, BlockTag::Number);
        self.client
            .call(&to_call_request(msg), tag)
            .await
            .map_err(classify)
    }

    async fn send_transaction(&self, request: &TxRequest) -> Result<TxHash, LedgerError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| LedgerError::Signer("no signing credential loaded".into()))?;
        if request.from != signer.address() {
            return Err(LedgerError::Signer(format!(
                "request is from {} but the loaded key controls {}",
                request.from,
                signer.address()
            )));
        }

        let chain_id = self.chain_id().await?;
        let nonce = self
            .client
            .transaction_count(request.from, BlockTag::Pending)
            .await
            .map_err(classify)?;
        let gas_price = self.client.gas_price().await.map_err(classify)?;
        let gas_limit = self.gas_limit(request).await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: request.to,
            value: request.value,
            data: request.data.clone(),
            chain_id,
        };
        let signed = signer
            .sign_transaction(tx)
            .map_err(|e| LedgerError::Signer(e.to_string()))?;
        tracing::debug!(
            to = %request.to,
            nonce,
            gas_limit,
            %gas_price,
            tx_hash = %signed.hash,
            "broadcasting transaction"
        );

        let hash = TxHash::from(
            self.client
                .send_raw_transaction(&signed.raw)
                .await
                .map_err(classify)?,
        );
        if hash != signed.hash {
            tracing::warn!(local = %signed.hash, node = %hash, "node reported a different transaction hash");
        }
        Ok(hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, LedgerError> {
        let receipt = self
            .client
            .transaction_receipt(*tx_hash.as_b256())
            .await
            .map_err(classify)?;
        Ok(receipt.and_then(into_receipt))
    }
}

fn to_call_request(msg: &CallMsg) -> CallRequest {
    let request = CallRequest::new(msg.to, msg.data.clone()).with_value(msg.value);
    match msg.from {
        Some(from) => request.with_from(from),
        None => request,
    }
}

fn with_headroom(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100)
}

/// A receipt without a block number is still pending.
fn into_receipt(receipt: TransactionReceipt) -> Option<Receipt> {
    let block_number = receipt.block()?;
    let success = receipt.succeeded();
    Some(Receipt {
        tx_hash: TxHash::from(receipt.transaction_hash),
        block_number,
        success,
        logs: receipt
            .logs
            .into_iter()
            .map(|log| LogEntry {
                address: log.address,
                topics: log.topics,
                data: log.data,
            })
            .collect(),
        raw: receipt.raw,
    })
}

/// Sort a node error into the ledger's failure classes.
fn classify(err: RpcError) -> LedgerError {
    if err.is_transport() {
        return LedgerError::Unreachable(err.to_string());
    }
    if err.is_execution_revert() || is_vm_exception(&err) {
        return LedgerError::Reverted {
            reason: revert_reason(&err),
        };
    }
    match err {
        RpcError::Rpc { message, .. } => LedgerError::Rejected(message),
        other => LedgerError::Decode(other.to_string()),
    }
}

/// Hardhat phrases reverts as VM exceptions instead of using code 3.
fn is_vm_exception(err: &RpcError) -> bool {
    matches!(err, RpcError::Rpc { message, .. } if message.contains("VM Exception"))
}

fn revert_reason(err: &RpcError) -> RevertReason {
    if let Some(data) = err.revert_data().filter(|d| !d.is_empty()) {
        return decode_revert(&data);
    }
    match err {
        RpcError::Rpc { message, .. } => reason_from_message(message),
        _ => RevertReason::Empty,
    }
}

/// Fall back to the reason string embedded in the node's message.
fn reason_from_message(message: &str) -> RevertReason {
    if let Some(rest) = message.split_once("reverted with reason string '").map(|(_, r)| r) {
        return RevertReason::Error(rest.trim_end_matches('\'').to_string());
    }
    match message.split_once("execution reverted: ") {
        Some((_, reason)) if !reason.is_empty() => RevertReason::Error(reason.to_string()),
        _ => RevertReason::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_abi::revert::ERROR_SELECTOR;
    use govctl_abi::{encode, Token};
    use govctl_types::U256;

    fn rpc_error(code: i64, message: &str, data: Option<String>) -> RpcError {
        RpcError::Rpc {
            code,
            message: message.to_string(),
            data,
        }
    }

    #[test]
    fn transport_failures_are_unreachable() {
        let err = classify(RpcError::Transport("connection refused".into()));
        assert!(matches!(err, LedgerError::Unreachable(_)));
        let err = classify(RpcError::Http {
            status: 502,
            body: "bad gateway".into(),
        });
        assert!(matches!(err, LedgerError::Unreachable(_)));
    }

    #[test]
    fn revert_data_is_decoded() {
        let mut payload = ERROR_SELECTOR.to_vec();
        payload.extend(encode(&[Token::String("Governor: proposal not successful".into())]));
        let err = classify(rpc_error(
            3,
            "execution reverted: Governor: proposal not successful",
            Some(format!("0x{}", hex::encode(payload))),
        ));
        match err {
            LedgerError::Reverted { reason } => {
                assert_eq!(reason.to_string(), "Governor: proposal not successful")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn revert_reason_falls_back_to_message() {
        let err = classify(rpc_error(-32000, "execution reverted: GovernorVotes: too late", None));
        assert!(matches!(
            err,
            LedgerError::Reverted { reason: RevertReason::Error(ref m) } if m == "GovernorVotes: too late"
        ));

        let err = classify(rpc_error(
            -32603,
            "Error: VM Exception while processing transaction: reverted with reason string 'Governor: vote not currently active'",
            None,
        ));
        assert!(matches!(
            err,
            LedgerError::Reverted { reason: RevertReason::Error(ref m) } if m == "Governor: vote not currently active"
        ));
    }

    #[test]
    fn node_refusals_are_rejections() {
        let err = classify(rpc_error(-32000, "nonce too low", None));
        assert!(matches!(err, LedgerError::Rejected(ref m) if m == "nonce too low"));
        let err = classify(rpc_error(-32000, "insufficient funds for gas * price + value", None));
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[test]
    fn gas_headroom() {
        assert_eq!(with_headroom(100_000), 120_000);
        assert_eq!(with_headroom(u64::MAX), u64::MAX);
    }

    #[test]
    fn pending_receipt_is_none() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": null,
            "logs": []
        }))
        .unwrap();
        assert!(into_receipt(receipt).is_none());
    }

    #[tokio::test]
    async fn read_only_ledger_cannot_send() {
        let ledger = RpcLedger::new(EthClient::new("http://127.0.0.1:1").unwrap());
        let request = TxRequest {
            from: govctl_types::Address::ZERO,
            to: govctl_types::Address::ZERO,
            data: Bytes::new(),
            value: U256::ZERO,
            gas_limit: None,
        };
        let err = ledger.send_transaction(&request).await.unwrap_err();
        assert!(matches!(err, LedgerError::Signer(_)));
    }
}
