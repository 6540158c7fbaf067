use super::{first_result, RunOptions, ValidateRequest, ValidationClient};
use crate::config::Config;
use crate::error::{Result, ValidatorError};
use async_trait::async_trait;
use record_validator_common::{parse_result_batch, Record, ResultBatch, ValidationResult};
use std::time::Duration;
use tracing::debug;

/// HTTP経由の分類サービスクライアント
#[derive(Debug, Clone)]
pub struct HttpValidationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpValidationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.validate_endpoint()?,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: &ValidateRequest<'_>) -> Result<ResultBatch> {
        debug!(
            endpoint = %self.endpoint,
            records = body.records.len(),
            use_rag = body.use_rag,
            "POST validate"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ValidatorError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(status = status.as_u16(), bytes = text.len(), "validate response");

        parse_result_batch(&text)
            .map_err(|e| ValidatorError::Transport(format!("レスポンスのパースに失敗: {}", e)))
    }
}

#[async_trait]
impl ValidationClient for HttpValidationClient {
    async fn submit(&self, records: &[Record], options: &RunOptions) -> Result<ResultBatch> {
        self.post(&ValidateRequest::batch(records, options)).await
    }

    async fn submit_one(&self, record: &Record, _options: &RunOptions) -> Result<ValidationResult> {
        let batch = self.post(&ValidateRequest::single(record)).await?;
        first_result(batch)
    }
}
