//! The observed attention-contract state.
//!
//! These types mirror the JSON the gateway serves. The contract state is
//! read-only to this node: it is consumed as opaque, trusted data from the
//! external ledger and never written back directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Address, BlockHeight};

/// One epoch's worth of traffic-log bookkeeping on the contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficEpoch {
    /// Block height at which the current epoch opened.
    pub open: BlockHeight,
    /// Block height at which the current epoch closes. Always `> open`;
    /// a strict increase across consecutive reads marks a new epoch.
    pub close: BlockHeight,
    /// Per-epoch records. At most one entry has `block == open` — the
    /// "current" record.
    #[serde(default)]
    pub daily_log: Vec<EpochRecord>,
}

impl TrafficEpoch {
    /// The record for the currently open epoch, if the contract has
    /// created one yet.
    pub fn current_record(&self) -> Option<&EpochRecord> {
        self.daily_log.iter().find(|r| r.block == self.open)
    }
}

/// One entry in [`TrafficEpoch::daily_log`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochRecord {
    /// Epoch-open height this record belongs to.
    pub block: BlockHeight,
    /// Traffic-log submissions received this epoch, one per distinct owner.
    #[serde(default)]
    pub proposed_logs: Vec<LogProposal>,
    /// Whether the reward proposal for this record has been ranked.
    #[serde(default)]
    pub is_ranked: bool,
    /// Whether this record's rewards have been distributed.
    #[serde(default)]
    pub is_distributed: bool,
}

impl EpochRecord {
    /// Whether `owner` (or its gateway) already submitted a log this epoch.
    pub fn has_proposal_from(&self, owner: &Address, gateway_id: &str) -> bool {
        self.proposed_logs
            .iter()
            .any(|p| p.owner == *owner || p.gateway_id == gateway_id)
    }
}

/// A traffic-log submission recorded on the contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogProposal {
    /// Address of the submitting node.
    pub owner: Address,
    /// Identifier of the gateway whose traffic the log covers.
    pub gateway_id: String,
}

/// A vote open on the contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Contract-assigned vote id, increasing over the contract's lifetime.
    pub id: u64,
    /// Block height at which the vote ends. A vote is active for the
    /// current epoch iff `end == traffic_logs.close`.
    pub end: BlockHeight,
    /// Bundlers that have already relayed batches for this vote. Values
    /// are contract-internal and not interpreted here.
    #[serde(default)]
    pub bundlers: HashMap<Address, serde_json::Value>,
}

impl Vote {
    /// Whether this vote belongs to the epoch closing at `close`.
    pub fn is_active_for(&self, close: BlockHeight) -> bool {
        self.end == close
    }
}

/// The full contract state a node observes each loop iteration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    /// Traffic-log epoch bookkeeping.
    pub traffic_logs: TrafficEpoch,
    /// All votes currently known to the contract.
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// Stake per address. Presence with a nonzero amount gates registry
    /// admission and slashing.
    #[serde(default)]
    pub stakes: HashMap<Address, u64>,
}

impl ContractState {
    /// Whether `address` holds a nonzero stake.
    pub fn has_stake(&self, address: &Address) -> bool {
        self.stakes.get(address).is_some_and(|s| *s > 0)
    }

    /// Votes active for the current epoch, in contract order.
    pub fn active_votes(&self) -> impl Iterator<Item = &Vote> {
        let close = self.traffic_logs.close;
        self.votes.iter().filter(move |v| v.is_active_for(close))
    }
}
