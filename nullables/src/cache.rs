//! A cache double whose backend can be "taken down".

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use koru_gateway::{Cache, GatewayError};

/// In-memory [`Cache`] that ignores TTLs and can simulate an outage.
///
/// While down, every operation returns [`GatewayError::Cache`]; stored
/// entries survive the outage, matching a cache server restart.
pub struct NullCache {
    entries: Mutex<HashMap<String, String>>,
    down: AtomicBool,
}

impl NullCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            down: AtomicBool::new(false),
        }
    }

    /// Simulate the cache backend going away.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), GatewayError> {
        if self.down.load(Ordering::SeqCst) {
            Err(GatewayError::Cache("scripted cache outage".into()))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError> {
        self.check_up()?;
        Ok(self.lock().get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        _ttl: Option<Duration>,
    ) -> Result<(), GatewayError> {
        self.check_up()?;
        self.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_survive_an_outage() {
        let cache = NullCache::new();
        cache.set("k", "v".into(), None).await.unwrap();

        cache.set_down(true);
        assert!(cache.get("k").await.is_err());

        cache.set_down(false);
        assert_eq!(cache.get("k").await.unwrap(), Some("v".into()));
    }
}
