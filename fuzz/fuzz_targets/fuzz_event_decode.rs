#![no_main]

use govctl_governance::contract::{governor, token};
use govctl_types::B256;
use libfuzzer_sys::fuzz_target;

// Receipt logs come from an untrusted node. Decoding any of the events the
// orchestrator reads must fail cleanly on garbage.
fuzz_target!(|data: &[u8]| {
    let events = [
        governor::proposal_created(),
        governor::vote_cast(),
        governor::proposal_executed(),
        token::delegate_changed(),
    ];

    // Up to three indexed topics taken from the front of the input.
    let split = data.len().min(96) / 32 * 32;
    let (topic_bytes, payload) = data.split_at(split);
    let extra: Vec<B256> = topic_bytes.chunks_exact(32).map(B256::from_slice).collect();

    for event in &events {
        let mut topics = vec![event.topic()];
        topics.extend_from_slice(&extra);
        let _ = event.decode_log(&topics, payload);
    }
});
