//! Request and response shapes for the Ethereum JSON-RPC methods in use.

use alloy_primitives::U64;
use govctl_types::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize, Serializer};

/// Block selector for `eth_call` / `eth_getTransactionCount`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Number(u64),
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Latest => serializer.serialize_str("latest"),
            Self::Pending => serializer.serialize_str("pending"),
            Self::Number(n) => serializer.serialize_str(&format!("0x{n:x}")),
        }
    }
}

/// Parameters of `eth_call` and `eth_estimateGas`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
}

impl CallRequest {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        if !value.is_zero() {
            self.value = Some(value);
        }
        self
    }
}

/// A log entry as returned inside a receipt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub log_index: Option<U64>,
}

/// `eth_getTransactionReceipt` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<U64>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    /// `0x1` success, `0x0` revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub logs: Vec<Log>,
    /// The receipt exactly as the node returned it.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl TransactionReceipt {
    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }

    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tag_serialization() {
        assert_eq!(serde_json::to_value(BlockTag::Latest).unwrap(), "latest");
        assert_eq!(serde_json::to_value(BlockTag::Pending).unwrap(), "pending");
        assert_eq!(serde_json::to_value(BlockTag::Number(255)).unwrap(), "0xff");
    }

    #[test]
    fn call_request_omits_empty_fields() {
        let to: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
        let json = serde_json::to_value(CallRequest::new(to, vec![0x3e, 0x4f]).with_value(U256::ZERO)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("to"));
        assert_eq!(obj["data"], "0x3e4f");
        assert!(!obj.contains_key("value"));
        assert!(!obj.contains_key("from"));
    }

    #[test]
    fn receipt_parsing() {
        let json = serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "blockHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512",
            "status": "0x0",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512",
                "topics": ["0x3333333333333333333333333333333333333333333333333333333333333333"],
                "data": "0x",
                "logIndex": "0x0"
            }]
        });
        let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(receipt.block(), Some(16));
        assert!(!receipt.succeeded());
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.gas_used, Some(U256::from(21000u64)));
    }
}
