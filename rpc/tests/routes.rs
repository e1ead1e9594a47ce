//! Route-level tests with scripted collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use koru_crypto::{sign_payload, KeyPair};
use koru_gateway::MemoryCache;
use koru_nullables::NullGateway;
use koru_registry::Registry;
use koru_rpc::{router, RpcState};
use koru_types::{
    ContractState, NodeRegistration, Receipt, RegistrationData, TrafficEpoch, VotePayload,
    VoteSubmission,
};
use koru_votes::VoteLedger;

struct Harness {
    gateway: Arc<NullGateway>,
    state: RpcState,
    _bundle_dir: TempDir,
}

fn harness() -> Harness {
    let gateway = Arc::new(NullGateway::new());
    let cache = Arc::new(MemoryCache::new());
    let bundle_dir = tempfile::tempdir().unwrap();
    let votes = Arc::new(
        VoteLedger::open(bundle_dir.path(), KeyPair::from_seed(&[9u8; 32])).unwrap(),
    );
    let state = RpcState {
        votes,
        registry: Registry::new(cache.clone()),
        reader: gateway.clone(),
        cache,
    };
    Harness {
        gateway,
        state,
        _bundle_dir: bundle_dir,
    }
}

fn signed_vote(seed: u8, vote_id: u64) -> VoteSubmission {
    let kp = KeyPair::from_seed(&[seed; 32]);
    let vote = VotePayload {
        vote_id,
        user_vote: true,
    };
    VoteSubmission {
        sender_address: kp.address(),
        signature: sign_payload(&kp, &vote).unwrap(),
        vote,
        owner: kp.owner(),
    }
}

fn signed_registration(seed: u8, url: &str, timestamp: u64) -> (KeyPair, NodeRegistration) {
    let kp = KeyPair::from_seed(&[seed; 32]);
    let data = RegistrationData {
        url: url.into(),
        timestamp,
    };
    let signature = sign_payload(&kp, &data).unwrap();
    (
        kp.clone(),
        NodeRegistration {
            owner: kp.owner(),
            signature,
            data,
        },
    )
}

fn post_json<T: serde::Serialize>(uri: &str, body: &T) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn heartbeat_answers_alive() {
    let h = harness();
    let response = router(h.state).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"alive");
}

#[tokio::test]
async fn vote_submission_returns_receipt() {
    let h = harness();
    h.gateway.set_block_height(1234);
    let app = router(h.state);

    let submission = signed_vote(1, 7);
    let response = app
        .oneshot(post_json("/submit-vote", &submission))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: Receipt = body_json(response).await;
    assert_eq!(receipt.block_height, 1234);
    assert_eq!(receipt.vote.sender_address, submission.sender_address);
    assert!(!receipt.signature.is_empty());
}

#[tokio::test]
async fn duplicate_vote_conflicts() {
    let h = harness();
    let app = router(h.state);

    let submission = signed_vote(1, 7);
    let first = app
        .clone()
        .oneshot(post_json("/submit-vote", &submission))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/submit-vote", &submission))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn tampered_vote_is_rejected() {
    let h = harness();
    let app = router(h.state);

    let mut submission = signed_vote(1, 7);
    submission.vote.user_vote = false; // breaks the signature
    let response = app
        .oneshot(post_json("/submit-vote", &submission))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn traffic_log_serves_the_batch() {
    let h = harness();
    let app = router(h.state);

    for seed in 1..=3u8 {
        let response = app
            .clone()
            .oneshot(post_json("/submit-vote", &signed_vote(seed, 5)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get("/trafficlog?voteId=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let batch: Vec<VoteSubmission> = body_json(response).await;
    assert_eq!(batch.len(), 3);

    let missing = app.oneshot(get("/trafficlog?voteId=99")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staked_registration_is_admitted() {
    let h = harness();
    let (kp, registration) = signed_registration(4, "https://peer.example:8887", 1000);
    let mut contract = ContractState::default();
    contract.stakes.insert(kp.address(), 100);
    h.gateway.set_state(contract);
    let app = router(h.state);

    let response = app
        .clone()
        .oneshot(post_json("/register-node", &registration))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["admitted"], true);

    let nodes = app.oneshot(get("/nodes")).await.unwrap();
    let listed: Vec<NodeRegistration> = body_json(nodes).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].data.url, "https://peer.example:8887");
}

#[tokio::test]
async fn unstaked_registration_is_not_admitted() {
    let h = harness();
    let (_, registration) = signed_registration(4, "https://peer.example:8887", 1000);
    let app = router(h.state);

    let response = app
        .clone()
        .oneshot(post_json("/register-node", &registration))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["admitted"], false);
    let nodes = app.oneshot(get("/nodes")).await.unwrap();
    let listed: Vec<NodeRegistration> = body_json(nodes).await;
    assert!(listed.is_empty());
}

#[tokio::test]
async fn forged_registration_is_rejected() {
    let h = harness();
    let (_, mut registration) = signed_registration(4, "https://peer.example:8887", 1000);
    registration.data.url = "https://evil.example".into();
    let app = router(h.state);
    let response = app
        .oneshot(post_json("/register-node", &registration))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn state_route_serves_cache_unless_bypassed() {
    let h = harness();
    h.gateway.set_state(ContractState {
        traffic_logs: TrafficEpoch {
            open: 1000,
            close: 1720,
            daily_log: vec![],
        },
        votes: vec![],
        stakes: HashMap::new(),
    });
    let app = router(h.state);

    let first: ContractState = body_json(
        app.clone().oneshot(get("/state/current")).await.unwrap(),
    )
    .await;
    assert_eq!(first.traffic_logs.open, 1000);

    // The gateway moves on, but the cached view stays.
    h.gateway.set_state(ContractState {
        traffic_logs: TrafficEpoch {
            open: 1720,
            close: 2440,
            daily_log: vec![],
        },
        votes: vec![],
        stakes: HashMap::new(),
    });
    let cached: ContractState = body_json(
        app.clone().oneshot(get("/state/current")).await.unwrap(),
    )
    .await;
    assert_eq!(cached.traffic_logs.open, 1000);

    let live: ContractState = body_json(
        app.clone()
            .oneshot(get("/state/current?nocache=true"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(live.traffic_logs.open, 1720);

    // The bypass re-primed the cache.
    let after: ContractState =
        body_json(app.oneshot(get("/state/current")).await.unwrap()).await;
    assert_eq!(after.traffic_logs.open, 1720);
}
