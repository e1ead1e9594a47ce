//! Read-through caching of the contract state.
//!
//! Shared by the action loop and the `/state/current` route so both honor
//! the same key, TTL, and degradation behavior: a cold or failing cache
//! falls back to a live gateway read, and cache write failures are logged
//! and swallowed.

use std::time::Duration;

use koru_types::ContractState;

use crate::cache::Cache;
use crate::error::GatewayError;
use crate::traits::LedgerReader;

/// Cache key holding the serialized contract state.
pub const CONTRACT_STATE_KEY: &str = "contract-state";

/// How long a cached contract state stays fresh.
pub const CONTRACT_STATE_TTL: Duration = Duration::from_secs(5 * 60);

/// Fetch the contract state, preferring the cache.
///
/// Only a live-read failure is surfaced; cache trouble merely downgrades
/// to the live path.
pub async fn read_through(
    cache: &dyn Cache,
    reader: &dyn LedgerReader,
) -> Result<ContractState, GatewayError> {
    match cache.get(CONTRACT_STATE_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(state) => return Ok(state),
            Err(e) => {
                tracing::warn!("discarding unparseable cached state: {e}");
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("state cache unavailable, reading live: {e}");
        }
    }

    let state = reader.get_contract_state().await?;
    prime(cache, &state).await;
    Ok(state)
}

/// Refresh the cached contract state from a live read.
pub async fn refresh(
    cache: &dyn Cache,
    reader: &dyn LedgerReader,
) -> Result<ContractState, GatewayError> {
    let state = reader.get_contract_state().await?;
    prime(cache, &state).await;
    Ok(state)
}

/// Store `state` under [`CONTRACT_STATE_KEY`]. Failures are logged, not
/// surfaced: the cache is opportunistic.
pub async fn prime(cache: &dyn Cache, state: &ContractState) {
    let raw = match serde_json::to_string(state) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("failed to serialize state for cache: {e}");
            return;
        }
    };
    if let Err(e) = cache
        .set(CONTRACT_STATE_KEY, raw, Some(CONTRACT_STATE_TTL))
        .await
    {
        tracing::warn!("failed to prime state cache: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;
    use koru_types::{BlockHeight, TrafficEpoch};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl LedgerReader for CountingReader {
        async fn get_contract_state(&self) -> Result<ContractState, GatewayError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(ContractState {
                traffic_logs: TrafficEpoch {
                    open: 100,
                    close: 820,
                    daily_log: vec![],
                },
                ..Default::default()
            })
        }

        async fn get_block_height(&self) -> Result<BlockHeight, GatewayError> {
            Ok(0)
        }

        async fn get_transaction(
            &self,
            tx_id: &str,
        ) -> Result<crate::traits::TxRecord, GatewayError> {
            Err(GatewayError::TxNotFound(tx_id.to_string()))
        }
    }

    #[tokio::test]
    async fn warm_cache_skips_live_read() {
        let cache = MemoryCache::new();
        let reader = CountingReader {
            reads: AtomicUsize::new(0),
        };

        let first = read_through(&cache, &reader).await.unwrap();
        assert_eq!(first.traffic_logs.open, 100);
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);

        // Second read is served from the cache.
        read_through(&cache, &reader).await.unwrap();
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn garbage_in_cache_falls_back_to_live() {
        let cache = MemoryCache::new();
        cache
            .set(CONTRACT_STATE_KEY, "{not json".into(), None)
            .await
            .unwrap();
        let reader = CountingReader {
            reads: AtomicUsize::new(0),
        };
        read_through(&cache, &reader).await.unwrap();
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_always_reads_live() {
        let cache = MemoryCache::new();
        let reader = CountingReader {
            reads: AtomicUsize::new(0),
        };
        refresh(&cache, &reader).await.unwrap();
        refresh(&cache, &reader).await.unwrap();
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
    }
}
