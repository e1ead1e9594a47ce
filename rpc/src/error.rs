//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use koru_gateway::GatewayError;
use koru_registry::RegistryError;
use koru_votes::VoteError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("sender already submitted a vote for this batch")]
    DuplicateVote,

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("vote ledger error: {0}")]
    Votes(#[from] VoteError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::DuplicateVote => StatusCode::CONFLICT,
            Self::Votes(VoteError::BatchNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Votes(_) | Self::Registry(_) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(
            RpcError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RpcError::DuplicateVote.status(), StatusCode::CONFLICT);
        assert_eq!(
            RpcError::Votes(VoteError::BatchNotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RpcError::Gateway(GatewayError::Unreachable("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
