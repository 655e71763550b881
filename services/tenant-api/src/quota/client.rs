use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
struct ReserveUsageRequest<'a> {
    tenant_id: &'a str,
    instance_name: &'a str,
    feature: &'a str,
    amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservedUsage {
    pub feature: String,
    pub day: String,
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ReserveUsageResponse {
    usage: ReservedUsage,
}

#[derive(Debug, Clone, Deserialize)]
struct QuotaErrorBody {
    error: String,
    code: String,
    details: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum QuotaClientError {
    #[error("daily limit reached: {message}")]
    QuotaExceeded {
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("quota request rejected ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("usage tracker unreachable: {0}")]
    Transport(String),
}

/// HTTP client for the usage-tracker service. Feature-gated handlers
/// call `reserve` before performing the metered action.
pub struct QuotaClient {
    http_client: Client,
    base_url: String,
}

impl QuotaClient {
    pub fn new(base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build usage tracker client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn reserve(
        &self,
        tenant_id: &str,
        instance_name: &str,
        feature: &str,
        amount: u64,
    ) -> Result<ReservedUsage, QuotaClientError> {
        let url = format!("{}/api/usage/reserve", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&ReserveUsageRequest {
                tenant_id,
                instance_name,
                feature,
                amount,
            })
            .send()
            .await
            .map_err(|err| QuotaClientError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: ReserveUsageResponse = response
                .json()
                .await
                .map_err(|err| QuotaClientError::Transport(err.to_string()))?;
            return Ok(body.usage);
        }

        let body = response
            .json::<QuotaErrorBody>()
            .await
            .unwrap_or_else(|_| QuotaErrorBody {
                error: format!("usage tracker responded with {status}"),
                code: "unknown".to_string(),
                details: None,
            });

        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(QuotaClientError::QuotaExceeded {
                message: body.error,
                details: body.details,
            })
        } else {
            Err(QuotaClientError::Rejected {
                code: body.code,
                message: body.error,
            })
        }
    }
}
