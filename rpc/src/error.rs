//! RPC error types.

use thiserror::Error;

/// JSON-RPC error code geth and anvil use for execution reverts.
pub const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("request to node failed: {0}")]
    Transport(String),

    #[error("node returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("invalid {method} response: {detail}")]
    Decode { method: String, detail: String },
}

impl RpcError {
    /// Whether the node refused the call because it would revert.
    pub fn is_execution_revert(&self) -> bool {
        match self {
            Self::Rpc { code, message, .. } => {
                *code == EXECUTION_REVERTED || message.contains("execution reverted")
            }
            _ => false,
        }
    }

    /// Raw revert payload attached to an execution-revert error, if any.
    pub fn revert_data(&self) -> Option<Vec<u8>> {
        match self {
            Self::Rpc {
                data: Some(data), ..
            } => hex::decode(data.trim_start_matches("0x")).ok(),
            _ => None,
        }
    }

    /// Whether the failure happened before the node saw the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }

    pub(crate) fn decode(method: &str, detail: impl ToString) -> Self {
        Self::Decode {
            method: method.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_classification() {
        let err = RpcError::Rpc {
            code: 3,
            message: "execution reverted: Governor: vote not currently active".into(),
            data: Some("0x08c379a0".into()),
        };
        assert!(err.is_execution_revert());
        assert_eq!(err.revert_data().unwrap(), vec![0x08, 0xc3, 0x79, 0xa0]);
        assert!(!err.is_transport());

        let err = RpcError::Rpc {
            code: -32000,
            message: "insufficient funds for gas * price + value".into(),
            data: None,
        };
        assert!(!err.is_execution_revert());
        assert!(err.revert_data().is_none());
    }

    #[test]
    fn transport_classification() {
        assert!(RpcError::Transport("connection refused".into()).is_transport());
        assert!(RpcError::Http {
            status: 502,
            body: String::new()
        }
        .is_transport());
    }
}
