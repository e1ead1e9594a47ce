//! Anti-entropy gossip rounds.
//!
//! A round pulls one random peer's registry, merges it locally, then
//! pushes a freshly signed self-registration back to that peer. Delivery
//! is best-effort: eventual convergence across many rounds is the
//! correctness model, so push failures are logged and swallowed.

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use koru_crypto::{sign_payload, KeyPair};
use koru_types::{Address, NodeRegistration, RegistrationData};

use crate::error::RegistryError;
use crate::store::Registry;

/// Default timeout for gossip requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for peer registry endpoints.
pub struct GossipClient {
    http_client: reqwest::Client,
}

impl GossipClient {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { http_client }
    }

    fn map_send_error(e: reqwest::Error) -> RegistryError {
        if e.is_timeout() || e.is_connect() {
            RegistryError::PeerUnreachable(e.to_string())
        } else {
            RegistryError::RequestFailed(e.to_string())
        }
    }

    /// `GET {peer}/nodes` — fetch a peer's registry.
    pub async fn fetch_registry(&self, peer_url: &str) -> Result<Vec<NodeRegistration>, RegistryError> {
        let url = format!("{}/nodes", peer_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        if !response.status().is_success() {
            return Err(RegistryError::RequestFailed(format!(
                "GET {url}: HTTP status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }

    /// `POST {peer}/register-node` — push a registration to a peer.
    pub async fn post_registration(
        &self,
        peer_url: &str,
        registration: &NodeRegistration,
    ) -> Result<(), RegistryError> {
        let url = format!("{}/register-node", peer_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .json(registration)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        if !response.status().is_success() {
            return Err(RegistryError::RequestFailed(format!(
                "POST {url}: HTTP status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl Default for GossipClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One node's gossip participant: local registry plus peer client.
pub struct Gossip {
    client: GossipClient,
    registry: Registry,
    /// Peer to contact when the registry is empty (fresh node).
    bootstrap_url: String,
    /// URL other nodes should use to reach this node. `None` for nodes
    /// that only listen (they merge but never advertise).
    advertise_url: Option<String>,
    keypair: KeyPair,
}

impl Gossip {
    pub fn new(
        registry: Registry,
        bootstrap_url: String,
        advertise_url: Option<String>,
        keypair: KeyPair,
    ) -> Self {
        Self {
            client: GossipClient::new(),
            registry,
            bootstrap_url,
            advertise_url,
            keypair,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Sign a fresh self-registration with the current wall-clock time.
    pub fn self_registration(&self) -> Result<NodeRegistration, RegistryError> {
        let url = self
            .advertise_url
            .clone()
            .ok_or_else(|| RegistryError::RequestFailed("no advertise URL configured".into()))?;
        let data = RegistrationData {
            url,
            timestamp: unix_now_millis(),
        };
        let signature = sign_payload(&self.keypair, &data)?;
        Ok(NodeRegistration {
            owner: self.keypair.owner(),
            signature,
            data,
        })
    }

    /// Pick a gossip target: a uniformly random registry peer, or the
    /// bootstrap URL when the registry is empty. Our own advertised URL
    /// is never picked.
    async fn pick_peer(&self) -> Result<String, RegistryError> {
        let registry = self.registry.load().await;
        let candidates: Vec<&str> = registry
            .iter()
            .map(|r| r.data.url.as_str())
            .filter(|url| Some(*url) != self.advertise_url.as_deref())
            .collect();

        if let Some(peer) = candidates.choose(&mut rand::thread_rng()) {
            return Ok(peer.to_string());
        }
        if self.bootstrap_url.is_empty() {
            return Err(RegistryError::NoPeer);
        }
        Ok(self.bootstrap_url.clone())
    }

    /// Run one gossip round against a random peer.
    pub async fn run_round(&self, stakes: &HashMap<Address, u64>) -> Result<(), RegistryError> {
        let peer = self.pick_peer().await?;
        tracing::debug!(peer = %peer, "gossip round starting");

        let peer_registry = self.client.fetch_registry(&peer).await?;
        let merged = self.registry.merge_and_store(&peer_registry, stakes).await?;
        tracing::debug!(peer = %peer, registry_size = merged.len(), "peer registry merged");

        if self.advertise_url.is_some() {
            let registration = self.self_registration()?;
            self.registry
                .merge_and_store(std::slice::from_ref(&registration), stakes)
                .await?;
            if let Err(e) = self.client.post_registration(&peer, &registration).await {
                tracing::warn!(peer = %peer, "failed to push registration: {e}");
            }
        }
        Ok(())
    }
}

fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
