use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    /// No batch file exists for the requested vote id.
    #[error("no batch recorded for vote {0}")]
    BatchNotFound(u64),

    /// A stored batch line could not be parsed back.
    #[error("corrupt batch entry for vote {vote_id}: {source}")]
    CorruptBatch {
        vote_id: u64,
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] koru_crypto::CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
