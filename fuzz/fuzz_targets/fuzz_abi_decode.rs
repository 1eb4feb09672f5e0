#![no_main]

use govctl_abi::{decode, encode, ParamType};
use libfuzzer_sys::fuzz_target;

// Decoding node output must never panic, and whatever decodes must
// re-encode to the same words.
fuzz_target!(|data: &[u8]| {
    let shapes: [&[ParamType]; 5] = [
        &[ParamType::Uint(256)],
        &[ParamType::Uint(8)],
        &[ParamType::Bool],
        &[ParamType::Address, ParamType::String],
        &[
            ParamType::array(ParamType::Address),
            ParamType::array(ParamType::Uint(256)),
            ParamType::array(ParamType::Bytes),
            ParamType::FixedBytes(32),
        ],
    ];

    for types in shapes {
        if let Ok(tokens) = decode(types, data) {
            let again = decode(types, &encode(&tokens)).expect("re-encoded tokens decode");
            assert_eq!(tokens, again);
        }
    }
});
