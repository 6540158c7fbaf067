//! 分類サービスとの通信
//!
//! - `ValidationClient`: バッチ/1件の検証リクエスト（テストでは差し替え可能）
//! - `HttpValidationClient`: reqwest による実装

mod http;

pub use http::HttpValidationClient;

use crate::config::Config;
use crate::error::{Result, ValidatorError};
use async_trait::async_trait;
use record_validator_common::{Record, ResultBatch, ValidationResult};
use serde::Serialize;

/// 実行オプション
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// 補助ルール（RAG）を参照するか
    pub use_augmented_context: bool,
    pub temperature: f64,
    pub source: String,
}

impl RunOptions {
    pub fn from_config(config: &Config, use_augmented_context: bool) -> Self {
        Self {
            use_augmented_context,
            temperature: config.temperature,
            source: config.source.clone(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), false)
    }
}

/// `/validate` のリクエスト本文
#[derive(Debug, Serialize)]
pub struct ValidateRequest<'a> {
    pub records: &'a [Record],
    pub use_rag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

impl<'a> ValidateRequest<'a> {
    pub fn batch(records: &'a [Record], options: &'a RunOptions) -> Self {
        Self {
            records,
            use_rag: options.use_augmented_context,
            temperature: Some(options.temperature),
            source: Some(options.source.as_str()),
        }
    }

    /// 再検証用。RAGは常に無効
    pub fn single(record: &'a Record) -> Self {
        Self {
            records: std::slice::from_ref(record),
            use_rag: false,
            temperature: None,
            source: None,
        }
    }
}

/// 1件リクエストのレスポンスから先頭の結果を取り出す
pub fn first_result(batch: ResultBatch) -> Result<ValidationResult> {
    batch
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ValidatorError::Remote {
            status: 200,
            body: "レスポンスに結果が含まれていません".into(),
        })
}

#[async_trait]
pub trait ValidationClient: Send + Sync {
    /// バッチ全体を検証
    async fn submit(&self, records: &[Record], options: &RunOptions) -> Result<ResultBatch>;

    /// 1件だけ再検証（`use_augmented_context` は無視される）
    async fn submit_one(&self, record: &Record, options: &RunOptions) -> Result<ValidationResult>;
}
