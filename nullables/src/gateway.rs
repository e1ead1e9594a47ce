//! A scripted in-memory ledger gateway.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use koru_gateway::{
    GatewayError, LedgerReader, LedgerWriter, TrafficLogArgs, TxRecord, VoteArgs, VoteOutcome,
};
use koru_types::{BlockHeight, ContractState, TxId};

#[derive(Default)]
struct TxScript {
    /// Lookup attempts so far.
    polls: u32,
    /// Lookups that fail with a transient error before any real answer.
    fail_first: u32,
    /// The tx mines once `polls` reaches this. `None` means never.
    mine_after: Option<u32>,
}

#[derive(Default)]
struct Recorded {
    traffic_logs: Vec<TrafficLogArgs>,
    batches: Vec<String>,
    votes: Vec<VoteArgs>,
    stakes: Vec<u64>,
    rank_calls: u32,
    distribute_calls: u32,
    slash_calls: u32,
}

struct Inner {
    state: ContractState,
    block_height: BlockHeight,
    tx_counter: u64,
    scripts: HashMap<TxId, TxScript>,
    recorded: Recorded,
    /// Whether `propose_slash` has something to slash. `false` makes it
    /// answer `None` like a ledger with no slashable bundler.
    slash_has_target: bool,
    /// When set, freshly minted write transactions never mine.
    stall_minted: bool,
}

/// An in-memory [`LedgerReader`] + [`LedgerWriter`].
///
/// Transactions created by writes are mined immediately; transactions
/// scripted with [`mine_tx_after_polls`](Self::mine_tx_after_polls) mine
/// after that many lookups, and everything else stays unknown.
pub struct NullGateway {
    inner: Mutex<Inner>,
}

impl NullGateway {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ContractState::default(),
                block_height: 0,
                tx_counter: 0,
                scripts: HashMap::new(),
                recorded: Recorded::default(),
                slash_has_target: true,
                stall_minted: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the contract state served by `get_contract_state`.
    pub fn set_state(&self, state: ContractState) {
        self.lock().state = state;
    }

    /// Set the block height served by `get_block_height`.
    pub fn set_block_height(&self, height: BlockHeight) {
        self.lock().block_height = height;
    }

    /// Make `propose_slash` answer "nothing to slash".
    pub fn set_nothing_to_slash(&self) {
        self.lock().slash_has_target = false;
    }

    /// Control whether write transactions minted from now on ever mine.
    pub fn set_stall_minted_txs(&self, stall: bool) {
        self.lock().stall_minted = stall;
    }

    /// Script `tx_id` to mine after `polls` lookups.
    pub fn mine_tx_after_polls(&self, tx_id: &str, polls: u32) {
        self.lock()
            .scripts
            .entry(tx_id.to_string())
            .or_default()
            .mine_after = Some(polls);
    }

    /// Script the first `count` lookups of `tx_id` to fail transiently.
    pub fn fail_tx_lookups(&self, tx_id: &str, count: u32) {
        self.lock()
            .scripts
            .entry(tx_id.to_string())
            .or_default()
            .fail_first = count;
    }

    /// How many times `tx_id` has been looked up.
    pub fn tx_poll_count(&self, tx_id: &str) -> u32 {
        self.lock().scripts.get(tx_id).map_or(0, |s| s.polls)
    }

    pub fn recorded_traffic_logs(&self) -> Vec<TrafficLogArgs> {
        self.lock().recorded.traffic_logs.clone()
    }

    pub fn recorded_batches(&self) -> Vec<String> {
        self.lock().recorded.batches.clone()
    }

    pub fn recorded_votes(&self) -> Vec<VoteArgs> {
        self.lock().recorded.votes.clone()
    }

    pub fn recorded_stakes(&self) -> Vec<u64> {
        self.lock().recorded.stakes.clone()
    }

    pub fn rank_calls(&self) -> u32 {
        self.lock().recorded.rank_calls
    }

    pub fn distribute_calls(&self) -> u32 {
        self.lock().recorded.distribute_calls
    }

    pub fn slash_calls(&self) -> u32 {
        self.lock().recorded.slash_calls
    }

    /// Record a fresh tx id, mined immediately unless minting is stalled.
    fn mint_tx(inner: &mut Inner) -> TxId {
        inner.tx_counter += 1;
        let id = format!("null-tx-{}", inner.tx_counter);
        let mine_after = if inner.stall_minted { None } else { Some(0) };
        inner.scripts.insert(
            id.clone(),
            TxScript {
                polls: 0,
                fail_first: 0,
                mine_after,
            },
        );
        id
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerReader for NullGateway {
    async fn get_contract_state(&self) -> Result<ContractState, GatewayError> {
        Ok(self.lock().state.clone())
    }

    async fn get_block_height(&self) -> Result<BlockHeight, GatewayError> {
        Ok(self.lock().block_height)
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<TxRecord, GatewayError> {
        let mut inner = self.lock();
        let height = inner.block_height;
        let script = inner.scripts.entry(tx_id.to_string()).or_default();
        script.polls += 1;
        if script.fail_first > 0 {
            script.fail_first -= 1;
            return Err(GatewayError::Unreachable("scripted outage".into()));
        }
        match script.mine_after {
            Some(after) if script.polls > after => Ok(TxRecord {
                id: tx_id.to_string(),
                block_height: Some(height),
            }),
            _ => Err(GatewayError::TxNotFound(tx_id.to_string())),
        }
    }
}

#[async_trait]
impl LedgerWriter for NullGateway {
    async fn submit_traffic_log(&self, args: TrafficLogArgs) -> Result<TxId, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.traffic_logs.push(args);
        Ok(Self::mint_tx(&mut inner))
    }

    async fn rank_proposal(&self) -> Result<TxId, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.rank_calls += 1;
        Ok(Self::mint_tx(&mut inner))
    }

    async fn distribute_daily_rewards(&self) -> Result<TxId, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.distribute_calls += 1;
        Ok(Self::mint_tx(&mut inner))
    }

    async fn propose_slash(&self, _evidence: Option<TxId>) -> Result<Option<TxId>, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.slash_calls += 1;
        if !inner.slash_has_target {
            return Ok(None);
        }
        Ok(Some(Self::mint_tx(&mut inner)))
    }

    async fn stake(&self, amount: u64) -> Result<TxId, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.stakes.push(amount);
        Ok(Self::mint_tx(&mut inner))
    }

    async fn vote(&self, args: VoteArgs) -> Result<VoteOutcome, GatewayError> {
        let mut inner = self.lock();
        let vote_id = args.vote_id;
        inner.recorded.votes.push(args);
        Ok(VoteOutcome {
            message: format!("vote {vote_id} accepted"),
        })
    }

    async fn submit_batch(&self, batch_json: String) -> Result<TxId, GatewayError> {
        let mut inner = self.lock();
        inner.recorded.batches.push(batch_json);
        Ok(Self::mint_tx(&mut inner))
    }
}
