use proptest::prelude::*;

use govctl_abi::{decode, decode_revert, encode, ParamType, RevertReason, Token};
use govctl_types::{Address, U256};

fn arb_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

fn arb_uint() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes)
}

proptest! {
    /// Arbitrary input never panics the decoder.
    #[test]
    fn decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let types = [
            ParamType::array(ParamType::Address),
            ParamType::array(ParamType::Uint(256)),
            ParamType::array(ParamType::Bytes),
            ParamType::String,
        ];
        let _ = decode(&types, &data);
        let _ = decode_revert(&data);
    }

    /// Encoded output is always word-aligned.
    #[test]
    fn encoding_is_word_aligned(
        bytes in prop::collection::vec(any::<u8>(), 0..100),
        text in ".{0,80}",
    ) {
        let encoded = encode(&[Token::Bytes(bytes), Token::String(text)]);
        prop_assert_eq!(encoded.len() % 32, 0);
    }

    /// The proposal-shaped tuple decodes back to the values it was built from.
    #[test]
    fn proposal_tuple_decodes(
        targets in prop::collection::vec(arb_address(), 0..4),
        value in arb_uint(),
        calldata in prop::collection::vec(any::<u8>(), 0..70),
        description in "[ -~]{0,60}",
    ) {
        let tokens = vec![
            Token::Array(targets.into_iter().map(Token::Address).collect()),
            Token::Array(vec![Token::Uint(value)]),
            Token::Array(vec![Token::Bytes(calldata)]),
            Token::String(description),
        ];
        let types = [
            ParamType::array(ParamType::Address),
            ParamType::array(ParamType::Uint(256)),
            ParamType::array(ParamType::Bytes),
            ParamType::String,
        ];
        prop_assert_eq!(decode(&types, &encode(&tokens)).unwrap(), tokens);
    }

    /// Error(string) payloads surface the message unchanged.
    #[test]
    fn revert_message_is_verbatim(message in "[ -~]{0,120}") {
        let mut data = vec![0x08, 0xc3, 0x79, 0xa0];
        data.extend(encode(&[Token::String(message.clone())]));
        prop_assert_eq!(decode_revert(&data), RevertReason::Error(message));
    }
}
