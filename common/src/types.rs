//! 検証結果の型定義
//!
//! CLIと対話UIで共有される型:
//! - Record: ユーザーがアップロードした1件分の任意JSON
//! - ValidationResult: 分類サービスが返す1件分の判定
//! - ActionState: 判定に付随するUI操作状態
//! - ReviewItem: ValidationResult + ActionState（画面に並ぶ1行）
//! - Summary: 判定カテゴリごとの件数

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// アップロードされたレコード（スキーマなし）
pub type Record = serde_json::Value;

/// レコードID（数値または文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::convert::Infallible;

    /// 数値として読めれば Int、それ以外は Text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(trimmed.to_string()),
        })
    }
}

/// 判定カテゴリ（排他・網羅）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Verdict {
    Reprocess,
    Delete,
    Fix,
    Escalate,
    #[default]
    Undefined,
}

impl Verdict {
    /// 表示順
    pub const ALL: [Verdict; 5] = [
        Verdict::Reprocess,
        Verdict::Delete,
        Verdict::Fix,
        Verdict::Escalate,
        Verdict::Undefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Reprocess => "Reprocess",
            Verdict::Delete => "Delete",
            Verdict::Fix => "Fix",
            Verdict::Escalate => "Escalate",
            Verdict::Undefined => "Undefined",
        }
    }

    /// サマリー表示用アイコン
    pub fn icon(&self) -> &'static str {
        match self {
            Verdict::Reprocess => "🔁",
            Verdict::Delete => "🗑️",
            Verdict::Fix => "🛠️",
            Verdict::Escalate => "⚠️",
            Verdict::Undefined => "❓",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    /// 未知のタグや null は Undefined に寄せる
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .map(|s| crate::parser::coerce_verdict(&s))
            .unwrap_or_default())
    }
}

/// 分類サービスの判定結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub record_id: RecordId,

    #[serde(default)]
    pub result: Verdict,

    #[serde(default)]
    pub llm_reasoning: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// 処理ステータス（例: "OK"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_source: Option<String>,
}

impl ValidationResult {
    pub fn new(record_id: impl Into<RecordId>, result: Verdict) -> Self {
        Self {
            record_id: record_id.into(),
            result,
            llm_reasoning: String::new(),
            score: None,
            status: None,
            key_source: None,
        }
    }
}

/// UI操作状態（分類結果とは独立）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionState {
    /// ブックマーク
    pub marked: bool,
    /// Reprocess 承認（rejected と排他）
    pub accepted: bool,
    /// Delete 承認（accepted と排他）
    pub rejected: bool,
    /// 再検証リクエスト送信中
    pub retried: bool,
    pub feedback_sent: bool,
    pub emailed: bool,
    /// 一方向ラッチ
    pub worklisted: bool,
}

/// 画面に並ぶ1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(flatten)]
    pub result: ValidationResult,

    #[serde(flatten)]
    pub actions: ActionState,
}

impl ReviewItem {
    pub fn record_id(&self) -> &RecordId {
        &self.result.record_id
    }
}

impl From<ValidationResult> for ReviewItem {
    fn from(result: ValidationResult) -> Self {
        Self {
            result,
            actions: ActionState::default(),
        }
    }
}

/// 分類サービスのレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBatch {
    #[serde(default)]
    pub results: Vec<ValidationResult>,

    /// どの認証経路で処理されたか（表示専用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_source: Option<String>,
}

/// カテゴリ別件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub reprocess: usize,
    pub delete: usize,
    pub fix: usize,
    pub escalate: usize,
    pub undefined: usize,
}

impl Summary {
    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Reprocess => self.reprocess,
            Verdict::Delete => self.delete,
            Verdict::Fix => self.fix,
            Verdict::Escalate => self.escalate,
            Verdict::Undefined => self.undefined,
        }
    }

    pub(crate) fn increment(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Reprocess => self.reprocess += 1,
            Verdict::Delete => self.delete += 1,
            Verdict::Fix => self.fix += 1,
            Verdict::Escalate => self.escalate += 1,
            Verdict::Undefined => self.undefined += 1,
        }
    }

    pub fn total(&self) -> usize {
        Verdict::ALL.iter().map(|v| self.count(*v)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_untagged() {
        let id: RecordId = serde_json::from_str("3").unwrap();
        assert_eq!(id, RecordId::Int(3));

        let id: RecordId = serde_json::from_str("\"BDOC-9\"").unwrap();
        assert_eq!(id, RecordId::Text("BDOC-9".into()));
    }

    #[test]
    fn test_record_id_from_str() {
        assert_eq!("12".parse::<RecordId>().unwrap(), RecordId::Int(12));
        assert_eq!(" x-1 ".parse::<RecordId>().unwrap(), RecordId::Text("x-1".into()));
    }

    #[test]
    fn test_validation_result_deserialize_minimal() {
        let json = r#"{"record_id": 0, "result": "Delete"}"#;
        let r: ValidationResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.record_id, RecordId::Int(0));
        assert_eq!(r.result, Verdict::Delete);
        assert_eq!(r.llm_reasoning, "");
        assert!(r.score.is_none());
        assert!(r.status.is_none());
    }

    #[test]
    fn test_validation_result_null_result_is_undefined() {
        let json = r#"{"record_id": "a", "result": null, "score": 4.5, "status": "OK"}"#;
        let r: ValidationResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.result, Verdict::Undefined);
        assert_eq!(r.score, Some(4.5));
        assert_eq!(r.status.as_deref(), Some("OK"));
    }

    #[test]
    fn test_review_item_serialize_flat() {
        let item = ReviewItem::from(ValidationResult::new(1, Verdict::Fix));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"record_id\":1"));
        assert!(json.contains("\"result\":\"Fix\""));
        assert!(json.contains("\"feedbackSent\":false"));
        assert!(json.contains("\"worklisted\":false"));
        assert!(!json.contains("score"));
    }

    #[test]
    fn test_result_batch_without_key_source() {
        let batch: ResultBatch = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(batch.results.is_empty());
        assert!(batch.key_source.is_none());
    }

    #[test]
    fn test_summary_total() {
        let summary = Summary {
            reprocess: 1,
            delete: 2,
            fix: 0,
            escalate: 3,
            undefined: 1,
        };
        assert_eq!(summary.total(), 7);
        assert_eq!(summary.count(Verdict::Escalate), 3);
    }
}
