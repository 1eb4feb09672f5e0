//! HTTP JSON-RPC client.

use alloy_primitives::U64;
use govctl_types::{Address, Bytes, B256, U256};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::RpcError;
use crate::types::{BlockTag, CallRequest, TransactionReceipt};

/// Client for an Ethereum node's JSON-RPC endpoint.
///
/// Wraps `reqwest::Client` with the endpoint URL and provides typed methods
/// for each call the orchestrator needs. Cheap to clone.
#[derive(Clone)]
pub struct EthClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl EthClient {
    /// Create a client targeting `url` (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC 2.0 request and return the `result` member.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RpcError::decode(method, e))?;
        parse_response(method, json)
    }

    async fn request_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let result = self.request(method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::decode(method, e))
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.request_typed("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let n: U64 = self.request_typed("eth_blockNumber", json!([])).await?;
        Ok(n.to::<u64>())
    }

    /// `eth_call`; returns the raw return data.
    pub async fn call(&self, request: &CallRequest, block: BlockTag) -> Result<Bytes, RpcError> {
        self.request_typed("eth_call", json!([request, block])).await
    }

    pub async fn gas_price(&self) -> Result<U256, RpcError> {
        self.request_typed("eth_gasPrice", json!([])).await
    }

    pub async fn transaction_count(
        &self,
        address: Address,
        block: BlockTag,
    ) -> Result<u64, RpcError> {
        let n: U64 = self
            .request_typed("eth_getTransactionCount", json!([address, block]))
            .await?;
        Ok(n.to::<u64>())
    }

    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, RpcError> {
        self.request_typed("eth_estimateGas", json!([request])).await
    }

    /// Broadcast a signed transaction; returns its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let encoded = format!("0x{}", hex::encode(raw));
        self.request_typed("eth_sendRawTransaction", json!([encoded]))
            .await
    }

    /// `None` while the transaction is not yet included.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let method = "eth_getTransactionReceipt";
        let result = self.request(method, json!([hash])).await?;
        parse_receipt(method, result)
    }
}

/// Split a JSON-RPC response into its result or a classified error.
pub fn parse_response(method: &str, json: Value) -> Result<Value, RpcError> {
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let error: ErrorObject =
            serde_json::from_value(error.clone()).map_err(|e| RpcError::decode(method, e))?;
        let data = error.data.map(|d| match d {
            Value::String(s) => s,
            other => other.to_string(),
        });
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
            data,
        });
    }
    match json {
        Value::Object(mut obj) => obj
            .remove("result")
            .ok_or_else(|| RpcError::decode(method, "missing result")),
        other => Err(RpcError::decode(method, format!("not an object: {other}"))),
    }
}

fn parse_receipt(method: &str, result: Value) -> Result<Option<TransactionReceipt>, RpcError> {
    if result.is_null() {
        return Ok(None);
    }
    let mut receipt: TransactionReceipt =
        serde_json::from_value(result.clone()).map_err(|e| RpcError::decode(method, e))?;
    receipt.raw = result;
    Ok(Some(receipt))
}
