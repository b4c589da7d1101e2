// Chain service client

use crate::core::ChainTipInfo;
use crate::error::ServiceError;
use crate::network::BlockSubmission;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default chain service endpoint
pub const DEFAULT_NODE_URL: &str = "http://6857coin.csail.mit.edu";

/// Remote service that reports the chain tip and accepts solved blocks
#[async_trait]
pub trait ChainService: Send + Sync {
    /// Fetch the parent, difficulty and version to build on
    async fn fetch_tip(&self) -> Result<ChainTipInfo, ServiceError>;

    /// Submit a solved block; returns the service's response body
    async fn submit(&self, submission: &BlockSubmission) -> Result<String, ServiceError>;
}

/// HTTP/JSON implementation of [`ChainService`]
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    client: Client,
    base_url: String,
}

impl HttpChainClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ServiceError::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Parse a `/next` response body
pub fn parse_tip(url: &str, body: &str) -> Result<ChainTipInfo, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ChainService for HttpChainClient {
    async fn fetch_tip(&self) -> Result<ChainTipInfo, ServiceError> {
        let url = self.endpoint("next");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Http { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status { url, status: status.as_u16() });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Http { url: url.clone(), source })?;
        parse_tip(&url, &body)
    }

    async fn submit(&self, submission: &BlockSubmission) -> Result<String, ServiceError> {
        let url = self.endpoint("add");
        log::debug!(
            "Sending block to {}: {}",
            url,
            serde_json::to_string(submission).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|source| ServiceError::Http { url: url.clone(), source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Http { url: url.clone(), source })?;

        if !status.is_success() {
            return Err(ServiceError::Rejected { status: status.as_u16(), body });
        }
        Ok(body)
    }
}
