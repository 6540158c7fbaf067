//! エラー型定義

use crate::types::RecordId;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// アップロードされたJSONの形式が不正（配列でない等）
    #[error("Format error: {0}")]
    Format(String),

    /// 対象の record_id が結果セットに存在しない
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
