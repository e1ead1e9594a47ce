//! The per-epoch action state machine.
//!
//! `NodeRunState` holds the idempotency flags owned exclusively by the
//! local node. `evaluate` detects epoch rollover, adopts remote evidence
//! of completion, and reports which actions are currently due. Executing
//! the actions (and flipping flags on confirmation) is the runner's job.

use koru_types::{Address, BlockHeight, ContractState, ProtocolParams};

use crate::epoch::EpochWindow;

/// An action the node should perform now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DueAction {
    /// Cast ballots for active votes not yet processed.
    SearchVotes,
    /// Submit this epoch's traffic log.
    SubmitLog,
    /// Publish the collected vote batches as a ledger transaction.
    SubmitBatch,
    /// Propose slashing the bundler.
    ProposeSlash,
    /// Rank the epoch's reward proposal.
    RankProposal,
    /// Distribute the closed epoch's rewards.
    Distribute,
}

/// What identifies this node in the contract state.
#[derive(Clone, Debug)]
pub struct NodeIdentity {
    /// The node's ledger address.
    pub address: Address,
    /// The gateway this node submits traffic logs for.
    pub gateway_id: String,
}

/// Run state owned by the local node. Never persisted remotely; mutated
/// only by the node's own action completions and epoch-rollover detection.
#[derive(Clone, Debug, Default)]
pub struct NodeRunState {
    pub is_logs_submitted: bool,
    pub is_ranked: bool,
    pub is_distributed: bool,
    pub is_propose_slashed: bool,
    /// Batch publication bookkeeping for the Service role; resets with
    /// the other flags on rollover.
    pub is_batch_submitted: bool,
    /// Last observed block height.
    pub last_block: BlockHeight,
    /// The `close` of the last epoch we evaluated against. Zero until the
    /// first observation.
    pub last_epoch_close: BlockHeight,
    /// Highest vote id this node has cast a ballot for. Strictly
    /// increasing, never reset: vote ids grow over the contract lifetime.
    pub last_processed_vote: u64,
}

impl NodeRunState {
    /// Detect epoch rollover and reset the per-epoch flags.
    ///
    /// Flags reset only when `close` strictly increases from a previously
    /// nonzero value: the first observation after startup must not clear
    /// evidence adopted from the remote state.
    fn roll_epoch(&mut self, close: BlockHeight) {
        if self.last_epoch_close != 0 && close > self.last_epoch_close {
            tracing::info!(
                old_close = self.last_epoch_close,
                new_close = close,
                "epoch rolled over, resetting action flags"
            );
            self.is_logs_submitted = false;
            self.is_ranked = false;
            self.is_distributed = false;
            self.is_propose_slashed = false;
            self.is_batch_submitted = false;
        }
        self.last_epoch_close = close;
    }

    /// Adopt remote evidence of completion.
    ///
    /// If the contract already shows an action completed by this node,
    /// the local flag flips to done without executing anything. This is
    /// what turns "retry after a crash or a missed confirmation" into
    /// effectively at-most-once submission.
    fn adopt_remote_evidence(&mut self, state: &ContractState, identity: &NodeIdentity) {
        let Some(record) = state.traffic_logs.current_record() else {
            return;
        };
        if !self.is_logs_submitted
            && record.has_proposal_from(&identity.address, &identity.gateway_id)
        {
            tracing::debug!("traffic log already on contract, adopting as done");
            self.is_logs_submitted = true;
        }
        if !self.is_ranked && record.is_ranked {
            tracing::debug!("epoch already ranked on contract, adopting as done");
            self.is_ranked = true;
        }
        if !self.is_distributed && record.is_distributed {
            tracing::debug!("epoch already distributed on contract, adopting as done");
            self.is_distributed = true;
        }
    }

    /// Active votes this node has not yet cast a ballot for.
    pub fn unprocessed_votes(&self, state: &ContractState) -> Vec<u64> {
        let mut ids: Vec<u64> = state
            .active_votes()
            .map(|v| v.id)
            .filter(|id| *id > self.last_processed_vote)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Record that a ballot for `vote_id` was cast. The counter only
    /// moves forward.
    pub fn mark_vote_processed(&mut self, vote_id: u64) {
        if vote_id > self.last_processed_vote {
            self.last_processed_vote = vote_id;
        }
    }

    /// The transition function: classify `block` against the observed
    /// state and report which actions are due, in execution order.
    pub fn evaluate(
        &mut self,
        state: &ContractState,
        block: BlockHeight,
        params: &ProtocolParams,
        identity: &NodeIdentity,
    ) -> Vec<DueAction> {
        self.roll_epoch(state.traffic_logs.close);
        self.adopt_remote_evidence(state, identity);
        self.last_block = block;

        let window = EpochWindow::new(&state.traffic_logs, block, params);
        let mut due = Vec::new();

        if window.can_search_votes() && !self.unprocessed_votes(state).is_empty() {
            due.push(DueAction::SearchVotes);
        }
        if window.can_submit_traffic_log() && !self.is_logs_submitted {
            due.push(DueAction::SubmitLog);
        }
        if window.can_submit_vote_batch() && !self.is_batch_submitted {
            due.push(DueAction::SubmitBatch);
        }
        if window.can_propose_slash() && !self.is_propose_slashed {
            due.push(DueAction::ProposeSlash);
        }
        if window.can_rank() && !self.is_ranked {
            due.push(DueAction::RankProposal);
        }
        if window.can_distribute() && !self.is_distributed {
            due.push(DueAction::Distribute);
        }
        due
    }
}
