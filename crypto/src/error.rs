use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid public key encoding: {0}")]
    InvalidPublicKey(String),

    #[error("invalid secret key encoding: {0}")]
    InvalidSecretKey(String),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("wallet file error: {0}")]
    Wallet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
