use proptest::prelude::*;

use koru_node::epoch::EpochWindow;
use koru_types::{ProtocolParams, TrafficEpoch};

fn window_flags(params: &ProtocolParams, open: u64, block: u64) -> [bool; 5] {
    let epoch = TrafficEpoch {
        open,
        close: open + params.epoch_blocks,
        daily_log: vec![koru_types::EpochRecord {
            block: open,
            ..Default::default()
        }],
    };
    let w = EpochWindow::new(&epoch, block, params);
    [
        w.can_submit_traffic_log(),
        w.can_submit_vote_batch(),
        w.can_propose_slash(),
        w.can_rank(),
        w.can_distribute(),
    ]
}

proptest! {
    /// Before the epoch closes, at most one action window holds at any
    /// block height; at or past close, only distribute holds.
    #[test]
    fn at_most_one_window_holds_per_block(
        open in 0u64..10_000_000,
        offset in 0u64..2_000,
    ) {
        let params = ProtocolParams::mainnet();
        let block = open + offset;
        let flags = window_flags(&params, open, block);
        let active = flags.iter().filter(|f| **f).count();
        prop_assert!(active <= 1, "windows overlap at block {}: {:?}", block, flags);
        if block >= open + params.epoch_blocks {
            prop_assert!(flags[4], "distribute must hold at block {} past close", block);
        }
    }

    /// Devnet offsets preserve the same exclusivity.
    #[test]
    fn devnet_windows_are_exclusive_too(
        open in 0u64..1_000_000,
        offset in 0u64..200,
    ) {
        let params = ProtocolParams::devnet();
        let flags = window_flags(&params, open, open + offset);
        prop_assert!(flags.iter().filter(|f| **f).count() <= 1);
    }

    /// Gaps between windows are real: across a full epoch the submit-log
    /// window always holds at `open` and never after `open + submit_end`.
    #[test]
    fn submit_window_bounds(open in 0u64..10_000_000) {
        let params = ProtocolParams::mainnet();
        prop_assert!(window_flags(&params, open, open)[0]);
        prop_assert!(!window_flags(&params, open, open + params.offset_submit_end)[0]);
    }
}
