//! Block heights and the proposal voting window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A block height.
pub type BlockNumber = u64;

/// Block-height bounds of a proposal's voting window.
///
/// `start` is the Governor's `proposalSnapshot` and `end` its
/// `proposalDeadline`. Votes are accepted while `start < head <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VotingWindow {
    pub start: BlockNumber,
    pub end: BlockNumber,
}

impl VotingWindow {
    pub fn new(start: BlockNumber, end: BlockNumber) -> Self {
        Self { start, end }
    }

    /// Whether a vote mined at `head` falls inside the window.
    pub fn is_open_at(&self, head: BlockNumber) -> bool {
        head > self.start && head <= self.end
    }

    /// Blocks left until the deadline, zero once it has passed.
    pub fn remaining_blocks(&self, head: BlockNumber) -> u64 {
        self.end.saturating_sub(head)
    }

    /// Blocks left until voting opens, zero once it has.
    pub fn blocks_until_open(&self, head: BlockNumber) -> u64 {
        self.start.saturating_sub(head)
    }

    /// Rough wall-clock estimate of the time left until the deadline.
    ///
    /// This multiplies remaining blocks by an average block interval. Block
    /// production is not uniform, so the result is a heuristic for display
    /// only and must not be used as a timer.
    pub fn estimated_remaining(&self, head: BlockNumber, block_interval: Duration) -> Duration {
        estimate_duration(self.remaining_blocks(head), block_interval)
    }
}

impl fmt::Display for VotingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blocks {}..={}", self.start, self.end)
    }
}

/// Heuristic duration of `blocks` blocks at `block_interval` per block.
pub fn estimate_duration(blocks: u64, block_interval: Duration) -> Duration {
    let secs = blocks.saturating_mul(block_interval.as_secs());
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds() {
        let window = VotingWindow::new(100, 150);
        assert!(!window.is_open_at(100));
        assert!(window.is_open_at(101));
        assert!(window.is_open_at(150));
        assert!(!window.is_open_at(151));
    }

    #[test]
    fn remaining_saturates() {
        let window = VotingWindow::new(100, 150);
        assert_eq!(window.remaining_blocks(120), 30);
        assert_eq!(window.remaining_blocks(200), 0);
        assert_eq!(window.blocks_until_open(90), 10);
        assert_eq!(window.blocks_until_open(120), 0);
    }

    #[test]
    fn twelve_second_estimate() {
        let window = VotingWindow::new(0, 50);
        let left = window.estimated_remaining(0, Duration::from_secs(12));
        assert_eq!(left, Duration::from_secs(600));
        assert_eq!(left.as_secs() / 60, 10);
    }
}
