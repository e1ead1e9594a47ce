//! Opportunistic key-value cache.
//!
//! The cache is a soft dependency: every caller must tolerate misses and
//! backend failures by falling back to live gateway reads.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::GatewayError;

/// String key-value cache with optional per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value. `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError>;

    /// Store a value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>)
        -> Result<(), GatewayError>;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-process cache backend.
///
/// Entries are dropped lazily on read; there is no sweeper task since the
/// node only keeps a handful of keys.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GatewayError::Cache("cache mutex poisoned".into()))?;
        match entries.get(key) {
            Some(entry) => {
                if entry.expires_at.is_some_and(|t| Instant::now() >= t) {
                    entries.remove(key);
                    Ok(None)
                } else {
                    Ok(Some(entry.value.clone()))
                }
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), GatewayError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GatewayError::Cache("cache mutex poisoned".into()))?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", "v".into(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".into()));
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_is_dropped() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v".into(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = MemoryCache::new();
        cache.set("k", "v1".into(), None).await.unwrap();
        cache.set("k", "v2".into(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v2".into()));
    }
}
