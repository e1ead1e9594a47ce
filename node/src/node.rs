//! The outer action loop and background tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use koru_crypto::KeyPair;
use koru_gateway::{
    state_cache, CacheHandle, ReaderHandle, TrafficLogArgs, VoteArgs, WriterHandle,
};
use koru_registry::Gossip;
use koru_types::ContractState;
use koru_votes::VoteLedger;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::role::Role;
use crate::shutdown::ShutdownController;
use crate::state::{DueAction, NodeIdentity, NodeRunState};
use crate::traffic::TrafficLogSource;
use crate::tx_waiter::TxWaiter;

/// How long to wait for background tasks to drain during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the node needs from the outside world, constructed once at
/// startup and shared with the background tasks.
pub struct NodeDeps {
    pub reader: ReaderHandle,
    pub writer: WriterHandle,
    pub cache: CacheHandle,
    pub keypair: KeyPair,
    pub votes: Arc<VoteLedger>,
    pub gossip: Arc<Gossip>,
    pub log_source: Arc<dyn TrafficLogSource>,
}

/// A running koru node.
///
/// The action loop is strictly sequential: it re-reads the contract
/// state, asks [`NodeRunState::evaluate`] what is due, and executes one
/// action at a time, waiting for each transaction to confirm before
/// moving on. Iteration errors are logged and retried next tick; only
/// shutdown ends the loop.
pub struct KoruNode {
    config: NodeConfig,
    role: Role,
    deps: NodeDeps,
    identity: NodeIdentity,
    run_state: NodeRunState,
    waiter: TxWaiter,
    pub shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl KoruNode {
    pub fn new(config: NodeConfig, role: Role, deps: NodeDeps) -> Self {
        let identity = NodeIdentity {
            address: deps.keypair.address(),
            gateway_id: config.gateway_id.clone(),
        };
        let waiter = TxWaiter::new(deps.reader.clone());
        Self {
            config,
            role,
            deps,
            identity,
            run_state: NodeRunState::default(),
            waiter,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn run_state(&self) -> &NodeRunState {
        &self.run_state
    }

    /// Run the node until shutdown.
    ///
    /// Stakes on startup if configured, primes the state cache, spawns
    /// the periodic tasks, then enters the action loop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        tracing::info!(
            role = %self.role,
            address = %self.identity.address,
            network = self.config.network.as_str(),
            "node starting"
        );

        self.ensure_stake().await?;

        match state_cache::refresh(self.deps.cache.as_ref(), self.deps.reader.as_ref()).await {
            Ok(_) => tracing::debug!("state cache primed"),
            Err(e) => tracing::warn!(error = %e, "could not prime state cache at startup"),
        }

        self.spawn_background_tasks();

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.loop_interval_secs));
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("action loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.iterate().await {
                        tracing::warn!(error = %e, "loop iteration failed, retrying next tick");
                    }
                }
            }
        }

        for handle in self.task_handles.drain(..) {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("background task did not drain before shutdown timeout");
            }
        }
        Ok(())
    }

    /// Place the configured startup stake if the node holds none.
    async fn ensure_stake(&self) -> Result<(), NodeError> {
        if self.config.stake_amount == 0 {
            return Ok(());
        }
        let state = self.deps.reader.get_contract_state().await?;
        if state.has_stake(&self.identity.address) {
            tracing::debug!("stake already present, skipping startup stake");
            return Ok(());
        }
        tracing::info!(amount = self.config.stake_amount, "placing startup stake");
        let tx_id = self.deps.writer.stake(self.config.stake_amount).await?;
        if !self.waiter.await_confirmation(&tx_id, "stake").await {
            return Err(NodeError::Config(
                "startup stake transaction never confirmed".into(),
            ));
        }
        Ok(())
    }

    /// Spawn the registry gossip and cache refresh timers. Each loops on
    /// its own interval and drains on the shared shutdown signal.
    fn spawn_background_tasks(&mut self) {
        if self.role.serves_network() {
            let gossip = Arc::clone(&self.deps.gossip);
            let reader = Arc::clone(&self.deps.reader);
            let cache = Arc::clone(&self.deps.cache);
            let mut shutdown_rx = self.shutdown.subscribe();
            let period = Duration::from_secs(self.config.gossip_interval_secs);
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => {
                            tracing::info!("gossip task shutting down");
                            break;
                        }
                        _ = interval.tick() => {
                            let stakes = match state_cache::read_through(cache.as_ref(), reader.as_ref()).await {
                                Ok(state) => state.stakes,
                                Err(e) => {
                                    tracing::warn!(error = %e, "skipping gossip round, no contract state");
                                    continue;
                                }
                            };
                            if let Err(e) = gossip.run_round(&stakes).await {
                                tracing::warn!(error = %e, "gossip round failed");
                            }
                        }
                    }
                }
            });
            self.task_handles.push(handle);
        }

        let reader = Arc::clone(&self.deps.reader);
        let cache = Arc::clone(&self.deps.cache);
        let mut shutdown_rx = self.shutdown.subscribe();
        let period = Duration::from_secs(self.config.cache_refresh_interval_secs);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The loop's first tick fires immediately; the startup prime
            // already covered it.
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("cache refresh task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match state_cache::refresh(cache.as_ref(), reader.as_ref()).await {
                            Ok(state) => tracing::debug!(
                                open = state.traffic_logs.open,
                                close = state.traffic_logs.close,
                                "state cache refreshed"
                            ),
                            Err(e) => tracing::warn!(error = %e, "state cache refresh failed"),
                        }
                    }
                }
            }
        });
        self.task_handles.push(handle);
    }

    /// One pass of the action loop.
    pub async fn iterate(&mut self) -> Result<(), NodeError> {
        let state =
            state_cache::read_through(self.deps.cache.as_ref(), self.deps.reader.as_ref()).await?;
        let block = self.deps.reader.get_block_height().await?;

        let due = self
            .run_state
            .evaluate(&state, block, &self.config.params(), &self.identity);
        if due.is_empty() {
            tracing::debug!(block, "nothing due");
            return Ok(());
        }

        for action in due {
            self.execute(action, &state).await?;
        }
        Ok(())
    }

    /// Execute one due action, if this role performs it. Flags flip only
    /// on confirmed completion, so an unconfirmed transaction retries on
    /// a later pass.
    async fn execute(&mut self, action: DueAction, state: &ContractState) -> Result<(), NodeError> {
        match action {
            DueAction::SearchVotes => self.cast_votes(state).await,
            DueAction::SubmitLog if self.role.submits_traffic_logs() => {
                self.submit_traffic_log().await
            }
            DueAction::SubmitBatch if self.role.submits_vote_batches() => {
                self.submit_vote_batch(state).await
            }
            DueAction::ProposeSlash if self.role.proposes_slashes() => self.propose_slash().await,
            DueAction::RankProposal => self.rank_proposal().await,
            DueAction::Distribute => self.distribute().await,
            _ => Ok(()),
        }
    }

    /// Cast ballots for every active vote not yet processed.
    async fn cast_votes(&mut self, state: &ContractState) -> Result<(), NodeError> {
        for vote_id in self.run_state.unprocessed_votes(state) {
            let args = VoteArgs {
                vote_id,
                direct: self.role.casts_direct_votes(),
            };
            let outcome = self.deps.writer.vote(args).await?;
            tracing::info!(vote_id, message = %outcome.message, "ballot cast");
            self.run_state.mark_vote_processed(vote_id);
        }
        Ok(())
    }

    async fn submit_traffic_log(&mut self) -> Result<(), NodeError> {
        let log_data = self.deps.log_source.collect().await?;
        let tx_id = self
            .deps
            .writer
            .submit_traffic_log(TrafficLogArgs {
                gateway_id: self.identity.gateway_id.clone(),
                log_data,
            })
            .await?;
        tracing::info!(tx_id = %tx_id, "traffic log submitted");
        if self.waiter.await_confirmation(&tx_id, "traffic-log").await {
            self.run_state.is_logs_submitted = true;
        }
        Ok(())
    }

    /// Publish the epoch's collected vote batches as one transaction.
    ///
    /// No active votes means there is nothing to publish; the epoch's
    /// batch work is simply done.
    async fn submit_vote_batch(&mut self, state: &ContractState) -> Result<(), NodeError> {
        let vote_ids: Vec<u64> = state.active_votes().map(|v| v.id).collect();
        // Write locks for votes past their epoch are no longer needed.
        self.deps.votes.prune_locks(&vote_ids).await;
        if vote_ids.is_empty() {
            tracing::debug!("no active votes, skipping batch submission");
            self.run_state.is_batch_submitted = true;
            return Ok(());
        }
        let batch = self.deps.votes.export(&vote_ids).await?;
        let tx_id = self.deps.writer.submit_batch(batch).await?;
        tracing::info!(tx_id = %tx_id, votes = vote_ids.len(), "vote batch submitted");
        if self.waiter.await_confirmation(&tx_id, "vote-batch").await {
            self.run_state.is_batch_submitted = true;
        }
        Ok(())
    }

    /// Propose slashing the bundler. The ledger decides whether there is
    /// anything to slash; a `None` answer completes the action without a
    /// transaction.
    async fn propose_slash(&mut self) -> Result<(), NodeError> {
        match self.deps.writer.propose_slash(None).await? {
            Some(tx_id) => {
                tracing::info!(tx_id = %tx_id, "slash proposed");
                if self.waiter.await_confirmation(&tx_id, "propose-slash").await {
                    self.run_state.is_propose_slashed = true;
                }
            }
            None => {
                tracing::info!("nothing to slash this epoch");
                self.run_state.is_propose_slashed = true;
            }
        }
        Ok(())
    }

    async fn rank_proposal(&mut self) -> Result<(), NodeError> {
        let tx_id = self.deps.writer.rank_proposal().await?;
        tracing::info!(tx_id = %tx_id, "rank submitted");
        if self.waiter.await_confirmation(&tx_id, "rank").await {
            self.run_state.is_ranked = true;
        }
        Ok(())
    }

    async fn distribute(&mut self) -> Result<(), NodeError> {
        let tx_id = self.deps.writer.distribute_daily_rewards().await?;
        tracing::info!(tx_id = %tx_id, "reward distribution submitted");
        if self.waiter.await_confirmation(&tx_id, "distribute").await {
            self.run_state.is_distributed = true;
        }
        Ok(())
    }
}
