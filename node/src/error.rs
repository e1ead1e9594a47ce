use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("gateway error: {0}")]
    Gateway(#[from] koru_gateway::GatewayError),

    #[error("vote ledger error: {0}")]
    Votes(#[from] koru_votes::VoteError),

    #[error("registry error: {0}")]
    Registry(#[from] koru_registry::RegistryError),

    #[error("crypto error: {0}")]
    Crypto(#[from] koru_crypto::CryptoError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
