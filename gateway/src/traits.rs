//! Ledger reader/writer traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use koru_types::{BlockHeight, ContractState, TxId};

use crate::error::GatewayError;

/// A transaction record looked up on the ledger. Presence alone means the
/// transaction was mined; the fields are informational.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub id: TxId,
    #[serde(default)]
    pub block_height: Option<BlockHeight>,
}

/// Arguments for a traffic-log submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficLogArgs {
    /// Gateway whose traffic the log covers.
    pub gateway_id: String,
    /// Opaque payload of log lines, already serialized.
    pub log_data: String,
}

/// Arguments for casting a vote through the gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteArgs {
    pub vote_id: u64,
    /// Whether to write the vote directly to the ledger rather than
    /// relaying it through a bundler.
    pub direct: bool,
}

/// The gateway's acknowledgement of a cast vote.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub message: String,
}

/// Read-only view of the external ledger.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch the current attention-contract state.
    async fn get_contract_state(&self) -> Result<ContractState, GatewayError>;

    /// Fetch the current block height.
    async fn get_block_height(&self) -> Result<BlockHeight, GatewayError>;

    /// Look up a transaction. Returns [`GatewayError::TxNotFound`] while
    /// the transaction is unmined.
    async fn get_transaction(&self, tx_id: &str) -> Result<TxRecord, GatewayError>;
}

/// Write operations against the external ledger.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Submit a traffic log for the open epoch.
    async fn submit_traffic_log(&self, args: TrafficLogArgs) -> Result<TxId, GatewayError>;

    /// Rank the open epoch's reward proposal.
    async fn rank_proposal(&self) -> Result<TxId, GatewayError>;

    /// Distribute the closed epoch's rewards.
    async fn distribute_daily_rewards(&self) -> Result<TxId, GatewayError>;

    /// Propose slashing a misbehaving bundler. `evidence` is an optional
    /// receipt tx id for callers that hold one; the ledger decides
    /// slashability either way. Returns `None` when there is nothing to
    /// slash.
    async fn propose_slash(&self, evidence: Option<TxId>) -> Result<Option<TxId>, GatewayError>;

    /// Stake tokens for this node.
    async fn stake(&self, amount: u64) -> Result<TxId, GatewayError>;

    /// Cast a vote.
    async fn vote(&self, args: VoteArgs) -> Result<VoteOutcome, GatewayError>;

    /// Publish an exported vote batch as a ledger transaction.
    async fn submit_batch(&self, batch_json: String) -> Result<TxId, GatewayError>;
}
