//! Registry persistence: one serialized array under a single cache key.

use std::collections::HashMap;

use koru_gateway::CacheHandle;
use koru_types::{Address, NodeRegistration};

use crate::error::RegistryError;
use crate::merge::merge;

/// Cache key holding the serialized registry.
pub const REGISTRY_KEY: &str = "node-registry";

/// The local node registry, persisted through the cache collaborator.
///
/// A cold or unavailable cache degrades to an empty registry; gossip then
/// repopulates it from the bootstrap peer.
#[derive(Clone)]
pub struct Registry {
    cache: CacheHandle,
}

impl Registry {
    pub fn new(cache: CacheHandle) -> Self {
        Self { cache }
    }

    /// Load the persisted registry. Unreadable or unparseable data is
    /// treated as empty rather than an error.
    pub async fn load(&self) -> Vec<NodeRegistration> {
        match self.cache.get(REGISTRY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(regs) => regs,
                Err(e) => {
                    tracing::warn!("discarding unparseable registry cache: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("registry cache unavailable: {e}");
                Vec::new()
            }
        }
    }

    /// Persist the registry. The registry has no TTL: it is only replaced
    /// by subsequent merges.
    pub async fn store(&self, registrations: &[NodeRegistration]) -> Result<(), RegistryError> {
        let raw = serde_json::to_string(registrations)?;
        self.cache.set(REGISTRY_KEY, raw, None).await?;
        Ok(())
    }

    /// Merge `incoming` into the persisted registry and store the result.
    ///
    /// Returns the merged registry. `stakes` gates admission and purges
    /// unstaked owners, existing entries included.
    pub async fn merge_and_store(
        &self,
        incoming: &[NodeRegistration],
        stakes: &HashMap<Address, u64>,
    ) -> Result<Vec<NodeRegistration>, RegistryError> {
        let existing = self.load().await;
        let merged = merge(&existing, incoming, stakes);
        self.store(&merged).await?;
        tracing::debug!(
            existing = existing.len(),
            incoming = incoming.len(),
            merged = merged.len(),
            "registry merged"
        );
        Ok(merged)
    }
}
