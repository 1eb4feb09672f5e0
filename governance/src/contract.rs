//! Call and event catalogue for the Governor and its ERC20Votes token.
//!
//! Every call the orchestrator makes is encoded by exactly one function in
//! this module, so the proposer, the executor and the identity derivation
//! all see byte-identical calldata.

use govctl_abi::{AbiError, Event, EventParam, Function, ParamType, Token};
use govctl_types::{Address, U256};

fn uint256() -> ParamType {
    ParamType::Uint(256)
}

/// Decode a single `uint256`-like return value.
pub fn decode_uint(function: &Function, data: &[u8]) -> Result<U256, AbiError> {
    single(function, data)?
        .as_uint()
        .ok_or_else(|| output_type(function, "uint"))
}

/// Decode a single `bool` return value.
pub fn decode_bool(function: &Function, data: &[u8]) -> Result<bool, AbiError> {
    single(function, data)?
        .as_bool()
        .ok_or_else(|| output_type(function, "bool"))
}

fn single(function: &Function, data: &[u8]) -> Result<Token, AbiError> {
    let mut tokens = function.decode_output(data)?;
    if tokens.len() != 1 {
        return Err(AbiError::ArityMismatch {
            expected: 1,
            got: tokens.len(),
        });
    }
    Ok(tokens.remove(0))
}

fn output_type(function: &Function, expected: &str) -> AbiError {
    AbiError::FieldType {
        field: function.name.clone(),
        expected: expected.to_string(),
    }
}

pub mod governor {
    use super::*;

    pub fn state() -> Function {
        Function::new("state", vec![uint256()], vec![ParamType::Uint(8)])
    }

    pub fn proposal_snapshot() -> Function {
        Function::new("proposalSnapshot", vec![uint256()], vec![uint256()])
    }

    pub fn proposal_deadline() -> Function {
        Function::new("proposalDeadline", vec![uint256()], vec![uint256()])
    }

    pub fn has_voted() -> Function {
        Function::new(
            "hasVoted",
            vec![uint256(), ParamType::Address],
            vec![ParamType::Bool],
        )
    }

    pub fn voting_delay() -> Function {
        Function::new("votingDelay", vec![], vec![uint256()])
    }

    pub fn voting_period() -> Function {
        Function::new("votingPeriod", vec![], vec![uint256()])
    }

    pub fn cast_vote_with_reason() -> Function {
        Function::new(
            "castVoteWithReason",
            vec![uint256(), ParamType::Uint(8), ParamType::String],
            vec![uint256()],
        )
    }

    pub fn propose() -> Function {
        Function::new(
            "propose",
            vec![
                ParamType::array(ParamType::Address),
                ParamType::array(uint256()),
                ParamType::array(ParamType::Bytes),
                ParamType::String,
            ],
            vec![uint256()],
        )
    }

    pub fn execute() -> Function {
        Function::new(
            "execute",
            vec![
                ParamType::array(ParamType::Address),
                ParamType::array(uint256()),
                ParamType::array(ParamType::Bytes),
                ParamType::FixedBytes(32),
            ],
            vec![uint256()],
        )
    }

    pub fn proposal_created() -> Event {
        Event::new(
            "ProposalCreated",
            vec![
                EventParam::new("proposalId", uint256()),
                EventParam::new("proposer", ParamType::Address),
                EventParam::new("targets", ParamType::array(ParamType::Address)),
                EventParam::new("values", ParamType::array(uint256())),
                EventParam::new("signatures", ParamType::array(ParamType::String)),
                EventParam::new("calldatas", ParamType::array(ParamType::Bytes)),
                EventParam::new("voteStart", uint256()),
                EventParam::new("voteEnd", uint256()),
                EventParam::new("description", ParamType::String),
            ],
        )
    }

    pub fn vote_cast() -> Event {
        Event::new(
            "VoteCast",
            vec![
                EventParam::indexed("voter", ParamType::Address),
                EventParam::new("proposalId", uint256()),
                EventParam::new("support", ParamType::Uint(8)),
                EventParam::new("weight", uint256()),
                EventParam::new("reason", ParamType::String),
            ],
        )
    }

    pub fn proposal_executed() -> Event {
        Event::new(
            "ProposalExecuted",
            vec![EventParam::new("proposalId", uint256())],
        )
    }
}

pub mod token {
    use super::*;
    use govctl_types::TokenAmount;

    pub fn mint_fn() -> Function {
        Function::new("mint", vec![ParamType::Address, uint256()], vec![])
    }

    pub fn balance_of() -> Function {
        Function::new("balanceOf", vec![ParamType::Address], vec![uint256()])
    }

    pub fn delegate_fn() -> Function {
        Function::new("delegate", vec![ParamType::Address], vec![])
    }

    pub fn get_votes() -> Function {
        Function::new("getVotes", vec![ParamType::Address], vec![uint256()])
    }

    /// Calldata for `mint(to, amount)`.
    pub fn mint(to: Address, amount: TokenAmount) -> Result<Vec<u8>, AbiError> {
        mint_fn().encode_input(&[Token::Address(to), Token::Uint(amount.raw())])
    }

    /// Calldata for `delegate(delegatee)`.
    pub fn delegate(delegatee: Address) -> Result<Vec<u8>, AbiError> {
        delegate_fn().encode_input(&[Token::Address(delegatee)])
    }

    pub fn delegate_changed() -> Event {
        Event::new(
            "DelegateChanged",
            vec![
                EventParam::indexed("delegator", ParamType::Address),
                EventParam::indexed("fromDelegate", ParamType::Address),
                EventParam::indexed("toDelegate", ParamType::Address),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_types::TokenAmount;

    #[test]
    fn governor_selectors() {
        assert_eq!(hex::encode(governor::state().selector()), "3e4f49e6");
        assert_eq!(hex::encode(governor::has_voted().selector()), "43859632");
        assert_eq!(hex::encode(governor::propose().selector()), "7d5e81e2");
        assert_eq!(hex::encode(governor::execute().selector()), "2656227d");
        assert_eq!(
            hex::encode(governor::cast_vote_with_reason().selector()),
            "7b3c71d3"
        );
    }

    #[test]
    fn token_selectors() {
        assert_eq!(hex::encode(token::mint_fn().selector()), "40c10f19");
        assert_eq!(hex::encode(token::balance_of().selector()), "70a08231");
        assert_eq!(hex::encode(token::delegate_fn().selector()), "5c19a95c");
    }

    #[test]
    fn mint_calldata_is_deterministic() {
        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let a = token::mint(to, TokenAmount::from_whole(100)).unwrap();
        let b = token::mint(to, TokenAmount::from_whole(100)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 68);
    }

    #[test]
    fn decode_state_output() {
        let mut ret = [0u8; 32];
        ret[31] = 7;
        assert_eq!(
            decode_uint(&governor::state(), &ret).unwrap(),
            U256::from(7u64)
        );
    }

    #[test]
    fn decode_has_voted_output() {
        let mut ret = [0u8; 32];
        ret[31] = 1;
        assert!(decode_bool(&governor::has_voted(), &ret).unwrap());
        assert!(decode_bool(&governor::has_voted(), &[]).is_err());
    }

    #[test]
    fn event_signatures() {
        assert_eq!(
            governor::proposal_created().signature(),
            "ProposalCreated(uint256,address,address[],uint256[],string[],bytes[],uint256,uint256,string)"
        );
        assert_eq!(
            governor::vote_cast().signature(),
            "VoteCast(address,uint256,uint8,uint256,string)"
        );
    }
}
