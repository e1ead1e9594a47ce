//! Epoch window classification.
//!
//! Pure functions mapping a block height onto the action windows of one
//! traffic-log epoch. Every window is half-open and derived from `open`
//! (or `close`) plus a fixed network-wide offset, so the windowed actions
//! are mutually exclusive by the offset ordering invariant.

use koru_types::{BlockHeight, ProtocolParams, TrafficEpoch};

/// A block height classified against one epoch's windows.
///
/// Borrowing view: construct one per loop iteration from the freshly
/// observed state, query the predicates, drop it.
#[derive(Clone, Copy)]
pub struct EpochWindow<'a> {
    epoch: &'a TrafficEpoch,
    block: BlockHeight,
    params: &'a ProtocolParams,
}

impl<'a> EpochWindow<'a> {
    pub fn new(epoch: &'a TrafficEpoch, block: BlockHeight, params: &'a ProtocolParams) -> Self {
        Self {
            epoch,
            block,
            params,
        }
    }

    fn within(&self, from_open: BlockHeight, until_open: BlockHeight) -> bool {
        let open = self.epoch.open;
        self.block >= open + from_open && self.block < open + until_open
    }

    /// Traffic-log submission: `[open, open + offset_submit_end)`.
    pub fn can_submit_traffic_log(&self) -> bool {
        self.within(0, self.params.offset_submit_end)
    }

    /// Vote-batch submission:
    /// `[open + offset_batch_submit, open + offset_propose_slash)`.
    pub fn can_submit_vote_batch(&self) -> bool {
        self.within(self.params.offset_batch_submit, self.params.offset_propose_slash)
    }

    /// Slash proposal: `[open + offset_propose_slash, open + offset_rank)`.
    pub fn can_propose_slash(&self) -> bool {
        self.within(self.params.offset_propose_slash, self.params.offset_rank)
    }

    /// Ranking: `[open + offset_rank, close)`. False while the contract
    /// has not created the current epoch record, since there is nothing
    /// to rank yet.
    pub fn can_rank(&self) -> bool {
        self.epoch.current_record().is_some()
            && self.block >= self.epoch.open + self.params.offset_rank
            && self.block < self.epoch.close
    }

    /// Distribution: `block >= close`. False without a current epoch
    /// record — nothing to distribute.
    pub fn can_distribute(&self) -> bool {
        self.epoch.current_record().is_some() && self.block >= self.epoch.close
    }

    /// Vote search: allowed while `block < close - search_cutoff`. Not an
    /// epoch window proper; it is close-relative and overlaps the early
    /// windows deliberately.
    pub fn can_search_votes(&self) -> bool {
        self.block < self.epoch.close.saturating_sub(self.params.search_cutoff)
    }
}
