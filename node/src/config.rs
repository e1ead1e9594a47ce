//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use koru_types::{NetworkId, ProtocolParams};

use crate::NodeError;

/// Configuration for a koru node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network's protocol parameters to use.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Base URL of the ledger gateway this node reads state from and
    /// submits transactions through.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// URL of a well-known peer used to join the registry when the local
    /// registry is empty.
    #[serde(default = "default_bootstrap_url")]
    pub bootstrap_url: String,

    /// Publicly reachable URL of this node's own HTTP surface. `None`
    /// means the node does not advertise itself in the registry.
    #[serde(default)]
    pub advertise_url: Option<String>,

    /// Path to the wallet file holding this node's signing key.
    #[serde(default = "default_wallet_path")]
    pub wallet_path: PathBuf,

    /// Directory where vote batches are appended.
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: PathBuf,

    /// Access log the traffic-log payload is read from.
    #[serde(default = "default_traffic_log_path")]
    pub traffic_log_path: PathBuf,

    /// Identifier of the gateway whose traffic this node attests to.
    #[serde(default)]
    pub gateway_id: String,

    /// Port for the node's HTTP surface (service role only).
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Stake placed on startup if the node holds none. Zero skips the
    /// startup stake entirely.
    #[serde(default)]
    pub stake_amount: u64,

    /// Seconds between run-loop iterations.
    #[serde(default = "default_loop_interval")]
    pub loop_interval_secs: u64,

    /// Seconds between registry gossip rounds.
    #[serde(default = "default_gossip_interval")]
    pub gossip_interval_secs: u64,

    /// Seconds between background contract-state cache refreshes.
    #[serde(default = "default_cache_refresh_interval")]
    pub cache_refresh_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_gateway_url() -> String {
    "http://localhost:8344".to_string()
}

fn default_bootstrap_url() -> String {
    "http://localhost:8887".to_string()
}

fn default_wallet_path() -> PathBuf {
    PathBuf::from("./wallet.json")
}

fn default_bundle_dir() -> PathBuf {
    PathBuf::from("./bundles")
}

fn default_traffic_log_path() -> PathBuf {
    PathBuf::from("./access.log")
}

fn default_server_port() -> u16 {
    8887
}

fn default_loop_interval() -> u64 {
    15
}

fn default_gossip_interval() -> u64 {
    60
}

fn default_cache_refresh_interval() -> u64 {
    300
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Protocol parameters for the configured network.
    pub fn params(&self) -> ProtocolParams {
        self.network.params()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            gateway_url: default_gateway_url(),
            bootstrap_url: default_bootstrap_url(),
            advertise_url: None,
            wallet_path: default_wallet_path(),
            bundle_dir: default_bundle_dir(),
            traffic_log_path: default_traffic_log_path(),
            gateway_id: String::new(),
            server_port: default_server_port(),
            stake_amount: 0,
            loop_interval_secs: default_loop_interval(),
            gossip_interval_secs: default_gossip_interval(),
            cache_refresh_interval_secs: default_cache_refresh_interval(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.server_port, 8887);
        assert_eq!(config.loop_interval_secs, 15);
        assert_eq!(config.log_format, "human");
        assert!(config.advertise_url.is_none());
        assert_eq!(config.network, NetworkId::Dev);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "main"
            gateway_url = "https://gateway.example.org"
            gateway_id = "gw-12"
            stake_amount = 500
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, NetworkId::Main);
        assert_eq!(config.gateway_url, "https://gateway.example.org");
        assert_eq!(config.gateway_id, "gw-12");
        assert_eq!(config.stake_amount, 500);
        assert_eq!(config.server_port, 8887); // default
    }

    #[test]
    fn params_follow_network() {
        let mut config = NodeConfig::default();
        assert_eq!(config.params().epoch_blocks, 72);
        config.network = NetworkId::Main;
        assert_eq!(config.params().epoch_blocks, 720);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/koru.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
