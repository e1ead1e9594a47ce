//! Axum router and handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use koru_crypto::verify_signature;
use koru_gateway::{state_cache, CacheHandle, ReaderHandle};
use koru_registry::Registry;
use koru_types::{ContractState, NodeRegistration, Receipt, VoteSubmission};
use koru_votes::{SubmitOutcome, VoteLedger};

use crate::error::RpcError;

/// Shared state behind every route.
#[derive(Clone)]
pub struct RpcState {
    pub votes: Arc<VoteLedger>,
    pub registry: Registry,
    pub reader: ReaderHandle,
    pub cache: CacheHandle,
}

/// Build the service node's router.
pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/", get(heartbeat))
        .route("/nodes", get(list_nodes))
        .route("/register-node", post(register_node))
        .route("/submit-vote", post(submit_vote))
        .route("/trafficlog", get(traffic_log))
        .route("/state/current", get(current_state))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe for peers and load balancers.
async fn heartbeat() -> &'static str {
    "alive"
}

/// The full local registry, as gossiped to peers.
async fn list_nodes(State(state): State<RpcState>) -> Json<Vec<NodeRegistration>> {
    Json(state.registry.load().await)
}

/// Accept a peer registration and merge it into the local registry.
///
/// Shape and signature problems are the caller's fault and get a 400.
/// An unstaked owner is silently not admitted, mirroring the merge rule;
/// the response reports whether the entry was kept.
async fn register_node(
    State(state): State<RpcState>,
    Json(registration): Json<NodeRegistration>,
) -> Result<Json<serde_json::Value>, RpcError> {
    if !registration.is_well_formed() {
        return Err(RpcError::InvalidRequest(
            "registration missing owner, signature, or url".into(),
        ));
    }
    if !verify_signature(
        &registration.owner,
        &registration.data,
        &registration.signature,
    ) {
        return Err(RpcError::InvalidSignature);
    }

    let stakes = state_cache::read_through(state.cache.as_ref(), state.reader.as_ref())
        .await?
        .stakes;
    let merged = state
        .registry
        .merge_and_store(std::slice::from_ref(&registration), &stakes)
        .await?;
    let admitted = merged.iter().any(|r| r.owner == registration.owner);
    tracing::debug!(owner = %registration.owner, admitted, "registration processed");
    Ok(Json(serde_json::json!({ "admitted": admitted })))
}

/// Accept a vote into its batch and return the signed receipt.
async fn submit_vote(
    State(state): State<RpcState>,
    Json(submission): Json<VoteSubmission>,
) -> Result<Json<Receipt>, RpcError> {
    if !submission.is_well_formed() {
        return Err(RpcError::InvalidRequest(
            "vote missing sender, signature, or owner".into(),
        ));
    }
    let block_height = state.reader.get_block_height().await?;
    match state.votes.submit(submission, block_height).await? {
        SubmitOutcome::Accepted(receipt) => Ok(Json(*receipt)),
        SubmitOutcome::Duplicate => Err(RpcError::DuplicateVote),
        SubmitOutcome::InvalidSignature => Err(RpcError::InvalidSignature),
    }
}

#[derive(Deserialize)]
struct TrafficLogQuery {
    #[serde(rename = "voteId")]
    vote_id: u64,
}

/// A vote batch in submission order, for bundler pickup.
async fn traffic_log(
    State(state): State<RpcState>,
    Query(query): Query<TrafficLogQuery>,
) -> Result<Json<Vec<VoteSubmission>>, RpcError> {
    Ok(Json(state.votes.read(query.vote_id).await?))
}

#[derive(Deserialize)]
struct StateQuery {
    #[serde(default)]
    nocache: bool,
}

/// The contract state, served from the cache unless `?nocache=true`.
async fn current_state(
    State(state): State<RpcState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<ContractState>, RpcError> {
    let contract_state = if query.nocache {
        state_cache::refresh(state.cache.as_ref(), state.reader.as_ref()).await?
    } else {
        state_cache::read_through(state.cache.as_ref(), state.reader.as_ref()).await?
    };
    Ok(Json(contract_state))
}

/// The HTTP server for a service node.
pub struct RpcServer {
    pub port: u16,
    pub state: RpcState,
}

impl RpcServer {
    pub fn new(port: u16, state: RpcState) -> Self {
        Self { port, state }
    }

    /// Serve until the shutdown signal fires.
    pub async fn start(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let app = router(self.state.clone());
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        tracing::info!(%addr, "rpc server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("rpc server shutting down");
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
