use record_validator_common::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    /// アップロード内容が不正。メッセージはそのまま画面に出す
    #[error("{0}")]
    Format(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIのURLが設定されていません。`record-validator config --set-api-url URL` で設定してください")]
    MissingApiUrl,

    #[error("通信エラー: {0}")]
    Transport(String),

    #[error("検証APIエラー (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("レコードが見つかりません: {0}")]
    NotFound(RecordId),

    #[error("操作できません: {0}")]
    Busy(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

impl From<record_validator_common::Error> for ValidatorError {
    fn from(err: record_validator_common::Error) -> Self {
        match err {
            record_validator_common::Error::Format(msg) => ValidatorError::Format(msg),
            record_validator_common::Error::NotFound(id) => ValidatorError::NotFound(id),
            record_validator_common::Error::Json(e) => ValidatorError::JsonParse(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
