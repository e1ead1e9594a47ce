//! Network-wide protocol parameters.
//!
//! The epoch window offsets are constants of the attention contract, not
//! per-node configuration: every node must agree on them or the windowed
//! actions drift apart.

use serde::{Deserialize, Serialize};

use crate::BlockHeight;

/// Protocol parameters shared by every node on a network.
///
/// All action windows are expressed as offsets from a traffic-log epoch's
/// `open` height. The ordering invariant
/// `offset_submit_end < offset_batch_submit < offset_propose_slash < offset_rank`
/// makes the open-relative windows mutually exclusive by construction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Nominal epoch length in blocks (`close - open` for a healthy epoch).
    pub epoch_blocks: BlockHeight,

    /// Traffic-log submission window end: `[open, open + offset_submit_end)`.
    pub offset_submit_end: BlockHeight,

    /// Vote-batch submission window start:
    /// `[open + offset_batch_submit, open + offset_propose_slash)`.
    pub offset_batch_submit: BlockHeight,

    /// Slash-proposal window start:
    /// `[open + offset_propose_slash, open + offset_rank)`.
    pub offset_propose_slash: BlockHeight,

    /// Ranking window start: `[open + offset_rank, close)`.
    pub offset_rank: BlockHeight,

    /// Vote search is allowed while `block < close - search_cutoff`.
    pub search_cutoff: BlockHeight,
}

impl ProtocolParams {
    /// Mainnet parameters: a ~720-block "daily" epoch.
    pub fn mainnet() -> Self {
        Self {
            epoch_blocks: 720,
            offset_submit_end: 420,
            offset_batch_submit: 470,
            offset_propose_slash: 570,
            offset_rank: 645,
            search_cutoff: 250,
        }
    }

    /// Compressed windows for local development and integration tests.
    pub fn devnet() -> Self {
        Self {
            epoch_blocks: 72,
            offset_submit_end: 42,
            offset_batch_submit: 47,
            offset_propose_slash: 57,
            offset_rank: 64,
            search_cutoff: 25,
        }
    }

    /// Check the window ordering invariant. Violations would let two
    /// windowed actions claim the same block height.
    pub fn offsets_are_ordered(&self) -> bool {
        self.offset_submit_end < self.offset_batch_submit
            && self.offset_batch_submit < self.offset_propose_slash
            && self.offset_propose_slash < self.offset_rank
            && self.offset_rank < self.epoch_blocks
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_offsets_are_ordered() {
        assert!(ProtocolParams::mainnet().offsets_are_ordered());
    }

    #[test]
    fn devnet_offsets_are_ordered() {
        assert!(ProtocolParams::devnet().offsets_are_ordered());
    }
}
