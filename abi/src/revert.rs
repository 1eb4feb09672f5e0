//! Revert payload decoding.

use govctl_types::U256;
use std::fmt;

use crate::codec::decode;
use crate::token::ParamType;

/// Selector of `Error(string)`.
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// Selector of `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Why a call reverted, as far as the payload tells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevertReason {
    /// `require(cond, "message")` / `revert("message")`.
    Error(String),
    /// Compiler-inserted panic, e.g. `0x11` for arithmetic overflow.
    Panic(U256),
    /// A custom error; the selector and raw arguments are kept as-is.
    Custom { selector: [u8; 4], data: Vec<u8> },
    /// Revert with no payload.
    Empty,
}

/// Decode revert data returned by a node.
///
/// Never fails: anything that is not a well-formed `Error` or `Panic` falls
/// back to `Custom` so the raw bytes still reach the operator.
pub fn decode_revert(data: &[u8]) -> RevertReason {
    if data.len() < 4 {
        return if data.is_empty() {
            RevertReason::Empty
        } else {
            RevertReason::Custom {
                selector: [0; 4],
                data: data.to_vec(),
            }
        };
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    let body = &data[4..];

    let decoded = match selector {
        ERROR_SELECTOR => decode(&[ParamType::String], body)
            .ok()
            .and_then(|mut t| t.pop())
            .and_then(|t| t.as_str().map(|s| RevertReason::Error(s.to_string()))),
        PANIC_SELECTOR => decode(&[ParamType::Uint(256)], body)
            .ok()
            .and_then(|mut t| t.pop())
            .and_then(|t| t.as_uint().map(RevertReason::Panic)),
        _ => None,
    };

    decoded.unwrap_or_else(|| RevertReason::Custom {
        selector,
        data: body.to_vec(),
    })
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => f.write_str(message),
            Self::Panic(code) => write!(f, "panic 0x{code:x}"),
            Self::Custom { selector, data } => write!(
                f,
                "custom error 0x{} (0x{})",
                hex::encode(selector),
                hex::encode(data)
            ),
            Self::Empty => f.write_str("reverted without reason"),
        }
    }
}
