use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A gossip peer could not be reached. Best-effort: the round is
    /// abandoned and retried on the next tick.
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    #[error("peer request failed: {0}")]
    RequestFailed(String),

    #[error("invalid peer response: {0}")]
    InvalidResponse(String),

    /// No peer in the registry and no bootstrap URL configured.
    #[error("no gossip peer available")]
    NoPeer,

    #[error("cache error: {0}")]
    Cache(#[from] koru_gateway::GatewayError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] koru_crypto::CryptoError),
}
