use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached (timeout or connection failure).
    /// Always transient: callers retry on the next loop iteration.
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with a non-success status.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The gateway answered with a body we could not parse.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The transaction is not (yet) known to the ledger. Expected during
    /// confirmation polling; only the TxWaiter timeout makes it a failure.
    #[error("transaction not found: {0}")]
    TxNotFound(String),

    /// The cache backend failed. Callers fall back to live reads.
    #[error("cache error: {0}")]
    Cache(String),
}

impl GatewayError {
    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::TxNotFound(_))
    }
}
