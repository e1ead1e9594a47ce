//! Where traffic-log payloads come from.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::NodeError;

/// Supplies the opaque log payload for a traffic-log submission.
///
/// The ledger does not interpret the payload; it only records who
/// attested to which gateway's traffic. Service and direct-witness nodes
/// read the gateway's access log, tests inject canned data.
#[async_trait]
pub trait TrafficLogSource: Send + Sync {
    async fn collect(&self) -> Result<String, NodeError>;
}

/// Reads the gateway's access log from a local file.
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TrafficLogSource for FileLogSource {
    async fn collect(&self) -> Result<String, NodeError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}
