//! HTTP implementation of the ledger reader/writer traits.
//!
//! Talks to a bundler-style gateway: contract state and block height are
//! plain GETs, writes are JSON POSTs that answer `{"id": "<tx id>"}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use koru_types::{BlockHeight, ContractState, TxId};

use crate::error::GatewayError;
use crate::traits::{LedgerReader, LedgerWriter, TrafficLogArgs, TxRecord, VoteArgs, VoteOutcome};

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a Koru gateway.
pub struct HttpGateway {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct InfoResponse {
    height: BlockHeight,
}

#[derive(Deserialize)]
struct TxResponse {
    id: TxId,
}

#[derive(Deserialize)]
struct SlashResponse {
    id: Option<TxId>,
}

impl HttpGateway {
    /// Create a gateway client for `base_url` with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            GatewayError::Unreachable(format!("connection failed: {e}"))
        } else {
            GatewayError::RequestFailed(e.to_string())
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "GET {path}: HTTP status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("GET {path}: {e}")))
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .http_client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "POST {path}: HTTP status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("POST {path}: {e}")))
    }
}

#[async_trait]
impl LedgerReader for HttpGateway {
    async fn get_contract_state(&self) -> Result<ContractState, GatewayError> {
        self.get_json("/state/current").await
    }

    async fn get_block_height(&self) -> Result<BlockHeight, GatewayError> {
        let info: InfoResponse = self.get_json("/info").await?;
        Ok(info.height)
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<TxRecord, GatewayError> {
        let path = format!("/tx/{tx_id}");
        let response = self
            .http_client
            .get(self.url(&path))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::TxNotFound(tx_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "GET {path}: HTTP status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("GET {path}: {e}")))
    }
}

#[async_trait]
impl LedgerWriter for HttpGateway {
    async fn submit_traffic_log(&self, args: TrafficLogArgs) -> Result<TxId, GatewayError> {
        let tx: TxResponse = self.post_json("/submit-traffic-log", &args).await?;
        Ok(tx.id)
    }

    async fn rank_proposal(&self) -> Result<TxId, GatewayError> {
        let tx: TxResponse = self.post_json("/rank-proposal", &()).await?;
        Ok(tx.id)
    }

    async fn distribute_daily_rewards(&self) -> Result<TxId, GatewayError> {
        let tx: TxResponse = self.post_json("/distribute-rewards", &()).await?;
        Ok(tx.id)
    }

    async fn propose_slash(&self, evidence: Option<TxId>) -> Result<Option<TxId>, GatewayError> {
        let body = serde_json::json!({ "evidence": evidence });
        let tx: SlashResponse = self.post_json("/propose-slash", &body).await?;
        Ok(tx.id)
    }

    async fn stake(&self, amount: u64) -> Result<TxId, GatewayError> {
        let body = serde_json::json!({ "amount": amount });
        let tx: TxResponse = self.post_json("/stake", &body).await?;
        Ok(tx.id)
    }

    async fn vote(&self, args: VoteArgs) -> Result<VoteOutcome, GatewayError> {
        self.post_json("/vote", &args).await
    }

    async fn submit_batch(&self, batch_json: String) -> Result<TxId, GatewayError> {
        let body = serde_json::json!({ "batch": batch_json });
        let tx: TxResponse = self.post_json("/batch", &body).await?;
        Ok(tx.id)
    }
}
