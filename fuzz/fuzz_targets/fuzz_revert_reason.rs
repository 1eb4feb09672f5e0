#![no_main]

use govctl_abi::decode_revert;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Total: every payload yields a reason that can be shown to the operator.
    let reason = decode_revert(data);
    let _ = reason.to_string();
});
