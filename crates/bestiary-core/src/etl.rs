//! Client for the external ETL service
//!
//! The ETL service pulls creature data from upstream and writes it to the
//! store. This client only asks it to run; it never reads or writes the
//! store or the cache itself.

use crate::config::EtlConfig;
use crate::{Result, StoreError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Creature id range the ETL run should load (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlRange {
    pub start_id: i64,
    pub end_id: i64,
}

impl Default for EtlRange {
    fn default() -> Self {
        Self {
            start_id: 1,
            end_id: 20,
        }
    }
}

impl EtlRange {
    pub fn new(start_id: i64, end_id: i64) -> Result<Self> {
        if start_id < 1 {
            return Err(StoreError::validation(format!(
                "start_id must be positive, got {}",
                start_id
            )));
        }
        if end_id < start_id {
            return Err(StoreError::validation(format!(
                "end_id {} is before start_id {}",
                end_id, start_id
            )));
        }
        Ok(Self { start_id, end_id })
    }
}

/// Result of one trigger attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlOutcome {
    pub success: bool,
    pub message: String,
    /// Response body of the ETL service on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure detail (transport error or status)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EtlOutcome {
    fn triggered(data: Value) -> Self {
        Self {
            success: true,
            message: "ETL pipeline triggered successfully".to_string(),
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            message: "Failed to trigger ETL pipeline".to_string(),
            data: None,
            error: Some(error),
        }
    }
}

/// HTTP client for `POST {base_url}/trigger-etl`
pub struct EtlClient {
    http: reqwest::Client,
    endpoint: String,
}

impl EtlClient {
    pub fn new(config: &EtlConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build ETL HTTP client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/trigger-etl", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the ETL service to load `range`.
    ///
    /// Transport failures, non-2xx statuses and non-JSON bodies are folded
    /// into an outcome with `success: false`.
    pub async fn trigger(&self, range: EtlRange) -> EtlOutcome {
        match self.send(range).await {
            Ok(data) => {
                info!(
                    start_id = range.start_id,
                    end_id = range.end_id,
                    "ETL pipeline triggered"
                );
                EtlOutcome::triggered(data)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Failed to trigger ETL");
                EtlOutcome::failed(format!("{:#}", e))
            }
        }
    }

    async fn send(&self, range: EtlRange) -> anyhow::Result<Value> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&range)
            .send()
            .await
            .context("ETL service unreachable")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("ETL service responded with status: {}", status.as_u16());
        }

        response
            .json::<Value>()
            .await
            .context("ETL service returned invalid JSON")
    }
}
