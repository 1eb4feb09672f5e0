//! Solidity ABI codec for the calls and events govctl needs.
//!
//! - [`ParamType`] / [`Token`]: the subset of ABI types used by Governor and
//!   ERC20Votes contracts (`address`, `uintN`, `bool`, `bytesN`, `bytes`,
//!   `string` and dynamic arrays of those)
//! - [`encode`] / [`decode`]: head/tail encoding of parameter tuples
//! - [`Function`]: canonical signature, selector, calldata encoding
//! - [`Event`]: topic hash and log decoding into named fields
//! - [`decode_revert`]: `Error(string)`, `Panic(uint256)` and custom errors

pub mod codec;
pub mod error;
pub mod event;
pub mod function;
pub mod revert;
pub mod token;

pub use codec::{decode, encode};
pub use error::AbiError;
pub use event::{DecodedEvent, Event, EventParam};
pub use function::Function;
pub use revert::{decode_revert, RevertReason};
pub use token::{ParamType, Token};

/// Size of an ABI word in bytes.
pub const WORD: usize = 32;
