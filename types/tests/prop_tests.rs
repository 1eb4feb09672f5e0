use proptest::prelude::*;

use std::time::Duration;

use govctl_types::{
    estimate_duration, ObservedState, ProposalId, ProposalState, TokenAmount, TxHash,
    VotingWindow, U256,
};

proptest! {
    /// ProposalId decimal display parses back to the same id.
    #[test]
    fn proposal_id_decimal_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = ProposalId::new(U256::from_be_bytes(bytes));
        let parsed: ProposalId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    /// Hex and decimal renderings of the same id parse to the same value.
    #[test]
    fn proposal_id_hex_equals_decimal(raw in any::<u128>()) {
        let dec: ProposalId = raw.to_string().parse().unwrap();
        let hex: ProposalId = format!("0x{raw:x}").parse().unwrap();
        prop_assert_eq!(dec, hex);
    }

    /// TxHash display parses back.
    #[test]
    fn tx_hash_display_parses(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        let parsed: TxHash = hash.to_string().parse().unwrap();
        prop_assert_eq!(parsed, hash);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Every ordinal decodes to either a known state with that ordinal or an
    /// unrecognized reading that keeps the raw value.
    #[test]
    fn observed_state_preserves_ordinal(ordinal in any::<u8>()) {
        let observed = ObservedState::from(ordinal);
        prop_assert_eq!(observed.ordinal(), ordinal);
        prop_assert_eq!(observed.known().is_some(), ordinal <= 7);
        prop_assert_eq!(ProposalState::try_from(ordinal).is_ok(), ordinal <= 7);
    }

    /// remaining_blocks never exceeds the window length and hits zero at the deadline.
    #[test]
    fn remaining_blocks_bounded(start in 0u64..1_000_000, len in 0u64..100_000, head in 0u64..2_000_000) {
        let window = VotingWindow::new(start, start + len);
        let remaining = window.remaining_blocks(head);
        prop_assert!(remaining <= start + len);
        if head >= start + len {
            prop_assert_eq!(remaining, 0);
        }
    }

    /// format_units then parse_units returns the same amount.
    #[test]
    fn token_amount_format_parse(raw in any::<u128>()) {
        let amount = TokenAmount::new(U256::from(raw));
        let parsed = TokenAmount::parse_units(&amount.format_units()).unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// Whole-token construction matches parsing the integer string.
    #[test]
    fn token_amount_whole(whole in 0u64..1_000_000_000) {
        prop_assert_eq!(
            TokenAmount::from_whole(whole),
            TokenAmount::parse_units(&whole.to_string()).unwrap()
        );
    }
}

#[test]
fn window_estimate_matches_block_estimate() {
    let window = VotingWindow::new(100, 150);
    let interval = Duration::from_secs(12);
    assert_eq!(
        window.estimated_remaining(120, interval),
        estimate_duration(30, interval)
    );
    assert_eq!(estimate_duration(30, interval), Duration::from_secs(360));
}
